//! `taskmate` - a terminal task assistant with long-term conversation memory
//!
//! Chats are proxied to an OpenAI-compatible endpoint. Saved conversations
//! land in a local transcript, get condensed into a running task list, and
//! the most relevant slice of past conversation is retrieved into every new
//! prompt.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use console::Style;
use dialoguer::Confirm;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use taskmate_core::config::{find_config_file, Config};
use taskmate_core::llm::{LlmClient, LlmConfig};
use taskmate_core::memory::{FastEmbedder, MemoryPipeline, Slot, SlotStore};

mod chat;
mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default().context("Failed to load configuration")?;
    tracing::debug!(
        model = %config.endpoint.model,
        memory_dir = %config.memory.resolve_data_dir().display(),
        "Configuration loaded"
    );

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let pipeline = build_pipeline(&config)?;
            chat::run(pipeline).await?;
        }

        Commands::Tasks => {
            let slots = open_slots(&config)?;
            match taskmate_core::memory::Summary::load(&slots)
                .context("Stored task list is unreadable")?
            {
                Some(summary) => println!("{}", summary.rendered().trim()),
                None => println!("No tasks saved yet."),
            }
        }

        Commands::History => {
            let slots = open_slots(&config)?;
            let transcript = taskmate_core::memory::TranscriptStore::new(Arc::new(slots));
            match transcript.read()? {
                Some(blob) => println!("{}", blob.trim_end()),
                None => println!("No conversations saved yet."),
            }
        }

        Commands::Clear { yes } => {
            let confirmed = yes
                || Confirm::new()
                    .with_prompt("Delete the saved transcript and task list?")
                    .default(false)
                    .interact()?;
            if confirmed {
                let slots = open_slots(&config)?;
                slots.delete(Slot::History)?;
                slots.delete(Slot::ImportantItems)?;
                println!("Memory cleared.");
            }
        }

        Commands::Config => {
            let blue = Style::new().blue();
            match find_config_file() {
                Some(path) => println!("{} {}", blue.apply_to("config:"), path.display()),
                None => println!("{} built-in defaults", blue.apply_to("config:")),
            }
            println!(
                "{} {}",
                blue.apply_to("memory:"),
                config.memory.resolve_data_dir().display()
            );
            print!("{}", config.render()?);
        }
    }

    Ok(())
}

fn open_slots(config: &Config) -> Result<SlotStore> {
    SlotStore::open(config.memory.resolve_data_dir())
        .context("Failed to open the memory directory")
}

fn build_pipeline(config: &Config) -> Result<Arc<MemoryPipeline>> {
    let slots = Arc::new(open_slots(config)?);
    let llm = Arc::new(
        LlmClient::new(LlmConfig::from_endpoint(&config.endpoint))
            .context("Failed to build the LLM client")?,
    );
    let embedder = Arc::new(
        FastEmbedder::new(&config.memory.embedding_model)
            .context("Failed to configure the embedding model")?,
    );
    let pipeline = MemoryPipeline::new(slots, llm, embedder, &config.memory)
        .context("Failed to build the memory pipeline")?;
    Ok(Arc::new(pipeline))
}
