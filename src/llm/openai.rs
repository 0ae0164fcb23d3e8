//! OpenAI-compatible chat completions client
//!
//! Default [`LlmProvider`] implementation. Works against any server speaking
//! the chat-completions wire format (OpenAI, LM Studio, vLLM, ...).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{AgentError, Result};

use super::{ChatRequest, ChatResponse, LlmProvider};

/// Default endpoint, pointed at a local LM Studio instance.
const DEFAULT_BASE_URL: &str = "http://localhost:1234/v1/chat/completions";

/// Generous timeout: local models can take minutes on long prompts.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// HTTP client for an OpenAI-compatible chat completions endpoint.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenAiClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Full URL of the chat completions endpoint; empty string
    ///   selects the local default
    /// * `api_key` - Bearer token; empty string sends no auth header
    pub fn new(base_url: &str, api_key: &str) -> Self {
        let base_url = if base_url.is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            base_url.to_string()
        };
        Self {
            base_url,
            api_key: api_key.to_string(),
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
        }
    }

    /// The endpoint this client posts to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        debug!(model = %req.model, messages = req.messages.len(), "Sending chat request");

        let mut http_req = self.client.post(&self.base_url).json(&req);
        if !self.api_key.is_empty() {
            http_req = http_req.bearer_auth(&self.api_key);
        }

        let resp = http_req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::Provider(format!(
                "LLM API error (status {}): {}",
                status.as_u16(),
                body
            )));
        }

        let chat_resp: ChatResponse = resp.json().await?;
        Ok(chat_resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_base_url() {
        let client = OpenAiClient::new("", "");
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_custom_base_url() {
        let client = OpenAiClient::new("https://api.example.com/v1/chat/completions", "sk-xxx");
        assert_eq!(
            client.base_url(),
            "https://api.example.com/v1/chat/completions"
        );
    }
}
