//! LLM client for OpenAI-compatible endpoints
//!
//! Works with OpenAI, Ollama, LM Studio and other servers speaking the
//! `/chat/completions` JSON API.

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, CONTENT_TYPE},
    Client as HttpClient, StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::chat::{ChatMessage, ChatRequest, ChatResponse};
use super::{ChatModel, LlmConfig, TokenUsage};
use crate::error::{Error, Result};

/// Chat-completion client for OpenAI-compatible endpoints
pub struct LlmClient {
    config: LlmConfig,
    http_client: HttpClient,
}

impl LlmClient {
    /// Create a new LLM client
    pub fn new(config: LlmConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(LlmClient {
            config,
            http_client,
        })
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build headers for API requests
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, "application/json".parse().expect("static header"));
        if let Some(api_key) = &self.config.api_key {
            if !api_key.is_empty() && api_key != "none" {
                let value = format!("Bearer {}", api_key)
                    .parse()
                    .map_err(|_| Error::InvalidConfig {
                        message: "API key contains characters not valid in a header".to_string(),
                    })?;
                headers.insert("Authorization", value);
            }
        }
        Ok(headers)
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let body = OpenAiRequest {
            model: self.config.model.clone(),
            messages: &request.messages,
            max_tokens: request.max_tokens.or(self.config.max_tokens),
            temperature: Some(request.temperature.unwrap_or(self.config.temperature)),
            stream: false,
        };

        debug!(model = %self.config.model, messages = request.messages.len(), "Sending chat completion");

        let response = self
            .http_client
            .post(&url)
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let response_body: OpenAiResponse = response.json().await?;
                Ok(ChatResponse {
                    content: response_body
                        .choices
                        .into_iter()
                        .next()
                        .map(|c| c.message.content)
                        .unwrap_or_default(),
                    usage: response_body.usage.map(|u| TokenUsage {
                        prompt_tokens: u.prompt_tokens,
                        completion_tokens: u.completion_tokens,
                        total_tokens: u.total_tokens,
                    }),
                })
            }
            StatusCode::UNAUTHORIZED => Err(Error::Unauthorized {
                message: "check your API key".to_string(),
            }),
            StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimited),
            status => {
                let error_body: Option<serde_json::Value> = response.json().await.ok();
                let message = error_body
                    .as_ref()
                    .and_then(|v| v.get("error").and_then(|e| e.get("message")))
                    .and_then(|v| v.as_str())
                    .unwrap_or("Unknown error")
                    .to_string();
                Err(Error::Provider {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

// OpenAI-compatible API types
#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: String,
    messages: &'a Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: String,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "llama3".to_string(),
            api_key: api_key.map(String::from),
            timeout_secs: 30,
            temperature: 0.7,
            max_tokens: None,
        }
    }

    #[test]
    fn test_headers_without_key() {
        let client = LlmClient::new(test_config(None)).unwrap();
        let headers = client.build_headers().unwrap();
        assert!(headers.get("Authorization").is_none());
    }

    #[test]
    fn test_headers_with_key() {
        let client = LlmClient::new(test_config(Some("sk-test"))).unwrap();
        let headers = client.build_headers().unwrap();
        assert_eq!(
            headers.get("Authorization").unwrap().to_str().unwrap(),
            "Bearer sk-test"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let request = ChatRequest::new(vec![ChatMessage::user("hi")]);
        let body = OpenAiRequest {
            model: "llama3".to_string(),
            messages: &request.messages,
            max_tokens: None,
            temperature: Some(0.7),
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["stream"], false);
        assert!(json.get("max_tokens").is_none());
    }
}
