//! CLI argument parsing using clap 4.x derive macros

use clap::{Parser, Subcommand};

/// A terminal task assistant with long-term conversation memory
///
/// Works with OpenAI-compatible endpoints (Ollama, LM Studio, local models).
/// Conversations you save are condensed into a running task list and fed
/// back into future chats.
#[derive(Parser, Debug)]
#[command(name = "taskmate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive chat session (the default)
    Chat,

    /// Show the current task list
    Tasks,

    /// Show the saved conversation transcript
    History,

    /// Delete the saved transcript and task list
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the resolved configuration
    Config,
}
