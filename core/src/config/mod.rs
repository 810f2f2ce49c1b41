//! Configuration management
//!
//! Loads `taskmate.toml` from the working directory or the platform config
//! directory. Everything has a default so a missing file is a valid setup,
//! with the API key pulled from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variables consulted for the API key, in priority order
const API_KEY_ENV_VARS: &[&str] = &["TASKMATE_API_KEY", "OPENAI_API_KEY"];

/// Unified taskmate configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Chat-completion endpoint settings
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Conversation-memory tuning
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Chat-completion endpoint configuration
///
/// Works with any OpenAI-compatible endpoint (OpenAI, Ollama, LM Studio,
/// local models).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Base URL of the API endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier to use
    #[serde(default = "default_model")]
    pub model: String,

    /// API key for authentication (optional)
    ///
    /// If not specified, TASKMATE_API_KEY and OPENAI_API_KEY are consulted.
    /// For local models (Ollama), this can be omitted entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per completion (provider default if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            max_tokens: None,
        }
    }
}

impl EndpointConfig {
    /// Resolve the API key from config or environment
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        API_KEY_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
    }
}

/// Conversation-memory tuning knobs
///
/// The chunking constants and top_k mirror the retrieval policy defaults;
/// they are policy values, not invariants, and can be adjusted freely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Retrieval chunk window size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Number of transcript chunks injected per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Override for the memory data directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            embedding_model: default_embedding_model(),
            data_dir: None,
        }
    }
}

impl MemoryConfig {
    /// Validate the chunking policy
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig {
                message: "memory.chunk_size must be greater than zero".to_string(),
            });
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig {
                message: format!(
                    "memory.chunk_overlap ({}) must be smaller than memory.chunk_size ({})",
                    self.chunk_overlap, self.chunk_size
                ),
            });
        }
        if self.top_k == 0 {
            return Err(Error::InvalidConfig {
                message: "memory.top_k must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve the directory holding the persisted memory slots
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        default_data_dir()
    }
}

impl Config {
    /// Load configuration from a specific file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content).map_err(|e| Error::InvalidConfig {
            message: format!("{}: {}", path.as_ref().display(), e),
        })?;
        config.memory.validate()?;
        Ok(config)
    }

    /// Save configuration to a file, creating parent directories as needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.render()?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from the standard locations, or fall back to defaults
    pub fn load_or_default() -> Result<Self> {
        match find_config_file() {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Render the configuration as pretty TOML
    pub fn render(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig {
            message: e.to_string(),
        })
    }
}

/// Find the configuration file in standard locations
///
/// `./taskmate.toml` wins over the platform config directory.
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        let path = cwd.join("taskmate.toml");
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(dir) = dirs::config_dir() {
        let path = dir.join("taskmate").join("taskmate.toml");
        if path.exists() {
            return Some(path);
        }
    }

    None
}

/// Default path for a freshly written config file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("taskmate").join("taskmate.toml"))
}

/// Default directory for the persisted memory slots
pub fn default_data_dir() -> PathBuf {
    if let Some(mut data_dir) = dirs::data_dir() {
        data_dir.push("taskmate/memory");
        return data_dir;
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".local/share/taskmate/memory");
    }
    PathBuf::from("./memory")
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_temperature() -> f32 {
    0.7
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_top_k() -> usize {
    1
}

fn default_embedding_model() -> String {
    "bge-small-en-v1.5".to_string()
}
