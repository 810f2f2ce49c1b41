//! Important-items summary
//!
//! The single current digest of the user's tasks, derived from the full
//! transcript by one completion call. Each refresh replaces the stored
//! value; the digest is a snapshot, not a log.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::slots::{Slot, SlotStore};
use super::transcript::today_tag;
use crate::error::Result;
use crate::llm::{ChatMessage, ChatModel, ChatRequest};
use crate::prompt;

/// The current task digest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Date header of the refresh that produced this digest, `"ON %Y-%m-%d:"`
    pub date_tag: String,
    /// The digest text
    pub text: String,
}

impl Summary {
    /// The form injected into prompts: date tag prepended to the text
    pub fn rendered(&self) -> String {
        format!("{}{}", self.date_tag, self.text)
    }

    /// Read the stored digest without a full store. `Ok(None)` when no
    /// refresh has ever run.
    pub fn load(slots: &SlotStore) -> Result<Option<Summary>> {
        match slots.get(Slot::ImportantItems)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

/// Store for the important-items digest over the `important_items` slot
pub struct SummaryStore {
    slots: Arc<SlotStore>,
    llm: Arc<dyn ChatModel>,
}

impl SummaryStore {
    pub fn new(slots: Arc<SlotStore>, llm: Arc<dyn ChatModel>) -> Self {
        Self { slots, llm }
    }

    /// The stored digest. `Ok(None)` when no refresh has ever run.
    pub fn get(&self) -> Result<Option<Summary>> {
        Summary::load(&self.slots)
    }

    /// Re-derive the digest from the full transcript and replace the stored
    /// value
    ///
    /// One completion attempt; a failed call leaves the previous digest in
    /// place and surfaces the error.
    pub async fn refresh(
        &self,
        transcript: &str,
        current: Option<&Summary>,
    ) -> Result<Summary> {
        let rendered = current.map(|s| s.rendered());
        let prompt = prompt::condense_prompt(transcript, rendered.as_deref())?;

        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);
        let response = self.llm.chat(request).await?;

        let summary = Summary {
            date_tag: today_tag(),
            text: response.content,
        };
        let json = serde_json::to_string(&summary)?;
        self.slots.set(Slot::ImportantItems, &json)?;
        debug!(date_tag = %summary.date_tag, "Refreshed important items");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedModel {
        replies: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedModel {
        fn new(replies: &[&str]) -> Self {
            Self {
                // Popped from the back, so store reversed
                replies: Mutex::new(replies.iter().rev().map(|s| s.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn chat(&self, request: ChatRequest) -> Result<crate::llm::ChatResponse> {
            self.prompts
                .lock()
                .unwrap()
                .push(request.messages.last().unwrap().content.clone());
            let content = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .ok_or(Error::Provider {
                    status: 500,
                    message: "no canned reply".to_string(),
                })?;
            Ok(crate::llm::ChatResponse {
                content,
                usage: None,
            })
        }
    }

    fn store_with(replies: &[&str]) -> (tempfile::TempDir, SummaryStore, Arc<CannedModel>) {
        let dir = tempfile::tempdir().unwrap();
        let slots = Arc::new(SlotStore::open(dir.path()).unwrap());
        let model = Arc::new(CannedModel::new(replies));
        let store = SummaryStore::new(slots, model.clone());
        (dir, store, model)
    }

    #[tokio::test]
    async fn test_get_absent() {
        let (_dir, store, _) = store_with(&[]);
        assert_eq!(store.get().unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_replaces_not_appends() {
        let (_dir, store, _) = store_with(&["buy milk", "buy milk, call mom"]);

        store.refresh("user: buy milk;\n ", None).await.unwrap();
        let first = store.get().unwrap().unwrap();
        assert_eq!(first.text, "buy milk");

        let current = store.get().unwrap();
        store
            .refresh("user: buy milk;\n user: call mom;\n ", current.as_ref())
            .await
            .unwrap();

        let second = store.get().unwrap().unwrap();
        assert_eq!(second.text, "buy milk, call mom");
        // Replacement, never concatenation
        assert!(!second.text.contains("buy milk, call mombuy milk"));
    }

    #[tokio::test]
    async fn test_refresh_prompt_includes_prior_summary() {
        let (_dir, store, model) = store_with(&["first", "second"]);

        store.refresh("transcript", None).await.unwrap();
        let current = store.get().unwrap();
        store.refresh("transcript", current.as_ref()).await.unwrap();

        let prompts = model.prompts.lock().unwrap();
        assert!(!prompts[0].contains("so far"));
        assert!(prompts[1].contains("tasks you have for the user so far"));
        assert!(prompts[1].contains("first"));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous() {
        let (_dir, store, _) = store_with(&["only reply"]);

        store.refresh("transcript", None).await.unwrap();
        let err = store.refresh("transcript", None).await.unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
        assert_eq!(store.get().unwrap().unwrap().text, "only reply");
    }
}
