//! Language-model transport
//!
//! Defines the [`LlmProvider`] trait plus the request/response types of an
//! OpenAI-compatible chat-completions API, and re-exports the default
//! [`OpenAiClient`] implementation. One request per call; the orchestrator
//! coarsens responses into step-based stream events, so no token-by-token
//! streaming is required from the transport.

pub mod openai;

pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::conversation::Message;
use crate::error::Result;

/// A tool definition passed to the model in function-calling schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Type tag (always "function")
    #[serde(rename = "type")]
    pub kind: String,
    /// Function name, description, and parameter schema
    pub function: ToolFunction,
}

/// Function-calling schema for a single tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolFunction {
    /// Tool name (must be unique within the catalog)
    pub name: String,
    /// Human-readable description shown to the model
    pub description: String,
    /// JSON Schema describing the tool's arguments
    pub parameters: serde_json::Value,
}

impl Tool {
    /// Build a function-type tool definition.
    pub fn function(name: &str, description: &str, parameters: serde_json::Value) -> Self {
        Self {
            kind: "function".to_string(),
            function: ToolFunction {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

/// A chat completion request payload.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model identifier
    pub model: String,
    /// Conversation history, system message first when present
    pub messages: Vec<Message>,
    /// Available tools; omitted from the wire when empty
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    /// Sampling temperature
    pub temperature: f32,
}

/// A chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Response choices; a response with zero choices is a transport-level
    /// failure as far as the orchestrator is concerned
    pub choices: Vec<Choice>,
    /// Token usage, when the server reports it
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// The model's message
    pub message: Message,
    /// Why generation stopped ("stop", "tool_calls", ...)
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage reported by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Trait for language-model transports.
///
/// Implementations translate a [`ChatRequest`] into one HTTP round-trip (or a
/// scripted response, in tests) and surface any failure as
/// `AgentError::Provider`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one chat completion request.
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse>;
}
