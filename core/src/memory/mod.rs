//! Long-term conversation memory
//!
//! Persistence slots, the committed transcript, the important-items digest,
//! per-query semantic retrieval, and the pipeline that ties them together.

pub mod pipeline;
pub mod retrieval;
pub mod slots;
pub mod summary;
pub mod transcript;

pub use pipeline::MemoryPipeline;
pub use retrieval::{Embedder, FastEmbedder, RetrievalIndex};
pub use slots::{Slot, SlotStore};
pub use summary::{Summary, SummaryStore};
pub use transcript::{today_tag, TranscriptRecord, TranscriptStore};
