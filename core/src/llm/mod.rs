//! LLM endpoint integration
//!
//! The pipeline talks to chat completion through the [`ChatModel`] trait so
//! tests can substitute a canned model; [`LlmClient`] is the production
//! implementation for OpenAI-compatible endpoints.

pub mod chat;
pub mod client;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, MessageRole};
pub use client::LlmClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::EndpointConfig;
use crate::error::Result;

/// Chat-completion capability
///
/// One request in, one response out. Errors surface to the caller; there is
/// no retry policy at this seam.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;
}

/// Connection settings for an LLM endpoint
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl LlmConfig {
    /// Build from the endpoint section of the app config, resolving the API
    /// key from the environment when the file leaves it unset.
    pub fn from_endpoint(endpoint: &EndpointConfig) -> Self {
        Self {
            base_url: endpoint.base_url.trim_end_matches('/').to_string(),
            model: endpoint.model.clone(),
            api_key: endpoint.resolve_api_key(),
            timeout_secs: endpoint.timeout_secs,
            temperature: endpoint.temperature,
            max_tokens: endpoint.max_tokens,
        }
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the prompt
    pub prompt_tokens: u32,
    /// Tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}
