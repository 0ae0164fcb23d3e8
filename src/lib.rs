//! NexusAgent - LLM agent orchestration with bounded-context conversation management
//!
//! The crate drives a multi-step tool-calling dialogue with a language model
//! while keeping the accumulated conversation within a fixed token budget:
//!
//! - [`agent::AgentLoop`] runs one chat turn end to end, executing tool calls
//!   requested by the model and streaming progress events.
//! - [`compact`] bounds conversation growth: a cheap model-free pruning pass
//!   plus a model-assisted summarizing compactor that folds old history into
//!   the system message.
//! - [`contextstore::ContextStore`] holds per-session pinned files injected
//!   into the system prompt.
//! - [`llm`] and [`toolbus`] are the interfaces to the model transport and the
//!   tool registry/dispatcher.

pub mod agent;
pub mod compact;
pub mod config;
pub mod contextstore;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod logging;
pub mod toolbus;

pub use agent::{AgentLoop, ChatTurnRequest, StreamEvent};
pub use compact::{estimate_tokens, micro_compact, CompactRequest, CompactResponse, Compactor};
pub use config::AgentConfig;
pub use contextstore::{ContextItem, ContextStore};
pub use conversation::{FunctionCall, Message, Role, ToolCall};
pub use error::{AgentError, Result};
pub use llm::{ChatRequest, ChatResponse, Choice, LlmProvider, OpenAiClient, Usage};
pub use toolbus::{ToolBus, ToolContent, ToolResult, ToolSpec};
