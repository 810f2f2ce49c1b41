//! Append-only conversation transcript
//!
//! Committed sessions are persisted as an explicit list of dated records,
//! serialized as JSON in the `history` slot. The rest of the pipeline never
//! sees the records directly; it consumes the flat rendering produced by
//! [`TranscriptStore::read`], one date header per commit followed by the
//! session's turns.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::slots::{Slot, SlotStore};
use crate::error::Result;
use crate::session::{render_history, Message};

/// One committed session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    /// Date header, `"ON %Y-%m-%d:"`
    pub date_tag: String,
    /// The session's turns in order
    pub turns: Vec<Message>,
}

impl TranscriptRecord {
    /// Flat rendering: the date header, a space, then the rendered turns
    pub fn render(&self) -> String {
        format!("{} {}", self.date_tag, render_history(&self.turns))
    }
}

/// Date tag for a given day
pub fn date_tag_for(date: NaiveDate) -> String {
    format!("ON {}:", date.format("%Y-%m-%d"))
}

/// Date tag for today, in local time
pub fn today_tag() -> String {
    date_tag_for(Local::now().date_naive())
}

/// Append-only store of committed sessions over the `history` slot
#[derive(Debug, Clone)]
pub struct TranscriptStore {
    slots: Arc<SlotStore>,
}

impl TranscriptStore {
    pub fn new(slots: Arc<SlotStore>) -> Self {
        Self { slots }
    }

    /// Commit a session under a date tag
    ///
    /// Loads the current record list (empty when the slot is absent),
    /// appends one record, writes the whole list back. Prior records are
    /// never edited; repeated commits of identical content simply grow the
    /// log.
    pub fn append(&self, turns: &[Message], date_tag: &str) -> Result<()> {
        let mut records = self.records()?;
        records.push(TranscriptRecord {
            date_tag: date_tag.to_string(),
            turns: turns.to_vec(),
        });
        let json = serde_json::to_string(&records)?;
        self.slots.set(Slot::History, &json)?;
        debug!(records = records.len(), "Committed session to transcript");
        Ok(())
    }

    /// The structured view. Empty when nothing has been committed.
    pub fn records(&self) -> Result<Vec<TranscriptRecord>> {
        match self.slots.get(Slot::History)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// The flat text blob: every record rendered in commit order.
    /// `None` when nothing has ever been committed.
    pub fn read(&self) -> Result<Option<String>> {
        match self.slots.get(Slot::History)? {
            Some(json) => {
                let records: Vec<TranscriptRecord> = serde_json::from_str(&json)?;
                Ok(Some(records.iter().map(|r| r.render()).collect()))
            }
            None => Ok(None),
        }
    }

    /// Whether anything has ever been committed
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.slots.get(Slot::History)?.is_none())
    }
}
