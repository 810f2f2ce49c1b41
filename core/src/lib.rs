pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod prompt;
pub mod session;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use llm::{ChatModel, LlmClient, LlmConfig};
pub use memory::{MemoryPipeline, SlotStore};
pub use session::{Conversation, Message, Role};
