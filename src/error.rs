//! Error types for NexusAgent
//!
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use thiserror::Error;

/// The primary error type for agent operations.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Configuration-related errors (invalid config, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model transport errors (API failures, non-2xx responses, empty choices)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Tool bus errors (catalog unavailable, tool invocation failures)
    #[error("Tool bus error: {0}")]
    ToolBus(String),

    /// Summarizing compaction failed; the caller should proceed with the
    /// uncompacted conversation
    #[error("Compaction error: {0}")]
    Compaction(String),

    /// Context store errors (persistence failures, invalid state)
    #[error("Context store error: {0}")]
    ContextStore(String),

    /// The request's cancellation signal fired. Distinct from failure so
    /// callers can tell "actively stopped" from "broke".
    #[error("Operation cancelled")]
    Cancelled,

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AgentError {
    /// Returns `true` if this error represents cooperative cancellation
    /// rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AgentError::Cancelled)
    }
}

/// A specialized `Result` type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
