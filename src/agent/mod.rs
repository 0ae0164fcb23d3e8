//! Agent orchestration
//!
//! Drives one end-to-end chat turn: prepares the tool catalog, injects pinned
//! context into the system prompt, auto-compacts the conversation when it
//! crosses the token threshold, then repeatedly calls the model and executes
//! requested tools until a final answer, the step ceiling, or cancellation.
//!
//! ```text
//! ┌───────────┐     ┌─────────────┐     ┌─────────────┐
//! │  caller   │────>│  AgentLoop  │────>│ LlmProvider │
//! │ (events)  │<────│             │     └─────────────┘
//! └───────────┘     │             │     ┌─────────────┐
//!                   │             │────>│   ToolBus   │
//!                   └──────┬──────┘     └─────────────┘
//!                          │
//!                          ▼
//!              ┌──────────────────────┐
//!              │ Compactor / Context  │
//!              │        Store         │
//!              └──────────────────────┘
//! ```
//!
//! Progress streams through a bounded `mpsc` channel as [`StreamEvent`]s; the
//! channel closes exactly once when the turn ends, on every exit path.

mod events;
mod r#loop;

pub use events::StreamEvent;
pub use r#loop::{AgentLoop, ChatTurnRequest};
