//! The conversation-memory pipeline
//!
//! Owns the open session and the three stores, and drives the
//! send → save → reset lifecycle:
//!
//! - `send` folds the session history, the current task digest and the most
//!   relevant transcript chunk into one completion call and appends the
//!   reply to the session;
//! - `save` commits the session to the transcript under today's date tag,
//!   re-derives the task digest from the full transcript, and restarts the
//!   session at the greeting;
//! - `reset` restarts the session without touching the stores.
//!
//! The session mutex doubles as a single-flight guard: while one operation
//! is awaiting an external call, a second send/save/reset fails fast with
//! `Error::Busy` instead of interleaving.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::retrieval::{Embedder, RetrievalIndex};
use super::slots::SlotStore;
use super::summary::{Summary, SummaryStore};
use super::transcript::{today_tag, TranscriptStore};
use crate::config::MemoryConfig;
use crate::error::{Error, Result};
use crate::llm::{ChatMessage, ChatModel, ChatRequest};
use crate::prompt;
use crate::session::{Conversation, Message};

/// Orchestrates the session, the stores and the external capabilities
pub struct MemoryPipeline {
    transcript: TranscriptStore,
    summary: SummaryStore,
    retrieval: RetrievalIndex,
    llm: Arc<dyn ChatModel>,
    session: Mutex<Conversation>,
    top_k: usize,
}

impl MemoryPipeline {
    /// Build a pipeline over an opened slot store
    pub fn new(
        slots: Arc<SlotStore>,
        llm: Arc<dyn ChatModel>,
        embedder: Arc<dyn Embedder>,
        memory: &MemoryConfig,
    ) -> Result<Self> {
        memory.validate()?;
        Ok(Self {
            transcript: TranscriptStore::new(slots.clone()),
            summary: SummaryStore::new(slots, llm.clone()),
            retrieval: RetrievalIndex::new(embedder, memory.chunk_size, memory.chunk_overlap)?,
            llm,
            session: Mutex::new(Conversation::new()),
            top_k: memory.top_k,
        })
    }

    /// Send a user message and return the assistant's reply
    ///
    /// The user message stays in the session even when the completion call
    /// fails; the caller sees the error and no assistant turn is added.
    pub async fn send(&self, text: &str) -> Result<String> {
        let mut session = self.session.try_lock().map_err(|_| Error::Busy)?;

        session.push(Message::user(text));
        let mut history_text = session.history_text();

        // Inject the most relevant committed context, if any exists. A
        // never-populated transcript skips retrieval entirely.
        if let Some(stored) = self.transcript.read()? {
            if let Some(context) = self.retrieval.query(&stored, text, self.top_k).await? {
                history_text.push_str(&context);
            }
        } else {
            debug!("No committed transcript, skipping retrieval");
        }

        let important_items = match self.summary.get()? {
            Some(summary) => summary.rendered(),
            None => prompt::NO_TASKS_PLACEHOLDER.to_string(),
        };

        let system = prompt::assistant_system_prompt(&important_items, &history_text)?;
        let request =
            ChatRequest::new(vec![ChatMessage::user(text)]).with_system_prompt(system);

        let response = self.llm.chat(request).await?;
        session.push(Message::assistant(response.content.clone()));
        debug!(turns = session.messages().len(), "Send completed");

        Ok(response.content)
    }

    /// Commit the session, refresh the task digest, restart at the greeting
    pub async fn save(&self) -> Result<Summary> {
        let mut session = self.session.try_lock().map_err(|_| Error::Busy)?;

        let date_tag = today_tag();
        self.transcript.append(session.messages(), &date_tag)?;

        // The slot was just written, so read() always yields the blob here
        let transcript_text = self.transcript.read()?.unwrap_or_default();
        let current = self.summary.get()?;
        let summary = self
            .summary
            .refresh(&transcript_text, current.as_ref())
            .await?;

        session.reset();
        info!(date_tag = %date_tag, "Session saved");
        Ok(summary)
    }

    /// Discard the session without touching the stores
    pub fn reset(&self) -> Result<()> {
        let mut session = self.session.try_lock().map_err(|_| Error::Busy)?;
        session.reset();
        Ok(())
    }

    /// Snapshot of the open session's turns
    pub fn messages(&self) -> Result<Vec<Message>> {
        let session = self.session.try_lock().map_err(|_| Error::Busy)?;
        Ok(session.messages().to_vec())
    }

    /// The committed transcript store
    pub fn transcript(&self) -> &TranscriptStore {
        &self.transcript
    }

    /// The important-items store
    pub fn summary_store(&self) -> &SummaryStore {
        &self.summary
    }
}
