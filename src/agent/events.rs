//! Stream events
//!
//! The discriminated union the orchestrator emits while processing one chat
//! turn. Each variant carries only the fields valid for its kind; consumers
//! cannot read a tool name off a `content` event. Events exist only inside a
//! request's channel and are never stored.

use serde::{Deserialize, Serialize};

use crate::conversation::Message;

/// A single event in a chat turn's progress stream.
///
/// Emitted in strict chronological order; a stream ends with exactly one
/// [`StreamEvent::Done`] or [`StreamEvent::Error`] followed by channel
/// closure (a cancelled request may close the channel without either).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Intermediate reasoning text, when the model surfaces any
    Thinking {
        content: String,
    },
    /// The model requested a tool invocation
    ToolCall {
        tool_name: String,
        tool_call_id: String,
        tool_args: String,
    },
    /// A tool invocation finished
    ToolResult {
        tool_name: String,
        tool_call_id: String,
        tool_result: String,
        is_error: bool,
    },
    /// Final answer text from the model
    Content {
        content: String,
    },
    /// The conversation was automatically compacted before the reasoning loop
    AutoCompact {
        content: String,
        tokens_before: usize,
        tokens_after: usize,
    },
    /// The turn completed; carries the full resulting conversation
    Done {
        history: Vec<Message>,
    },
    /// The turn failed; nothing further will be emitted
    Error {
        content: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_serialization() {
        let event = StreamEvent::ToolCall {
            tool_name: "get_record".to_string(),
            tool_call_id: "call_1".to_string(),
            tool_args: "{\"id\":7}".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"tool_call""#));
        assert!(json.contains(r#""tool_name":"get_record""#));
    }

    #[test]
    fn test_done_carries_history() {
        let event = StreamEvent::Done {
            history: vec![Message::user("hi"), Message::assistant("hello")],
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: StreamEvent = serde_json::from_str(&json).unwrap();
        match parsed {
            StreamEvent::Done { history } => assert_eq!(history.len(), 2),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_auto_compact_counts() {
        let event = StreamEvent::AutoCompact {
            content: "compacted".to_string(),
            tokens_before: 80_000,
            tokens_after: 12_000,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"auto_compact""#));
        assert!(json.contains(r#""tokens_before":80000"#));
    }
}
