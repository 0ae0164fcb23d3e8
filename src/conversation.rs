//! Conversation types
//!
//! Messages, roles, and tool calls in the OpenAI chat-completions wire shape.
//! These types are serialized directly into model requests, so optional
//! fields are skipped when absent and a `null` content deserializes to an
//! empty string (assistant turns that carry only tool calls).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompts and instructions; at most one per conversation, first
    System,
    /// Messages from the user
    User,
    /// Messages from the model
    Assistant,
    /// Results from tool executions
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A single message in a conversation.
///
/// Invariant: a `Tool`-role message's `tool_call_id` must match the `id` of a
/// tool call on an earlier assistant message in the same retained window.
/// Compaction preserves this pairing by only ever splitting the history at
/// user-message boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: Role,
    /// Text content; empty when an assistant turn carries only tool calls
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    /// Tool name, for `Tool`-role messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// ID of the tool call this message is responding to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool calls requested by the model, in execution order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// When this message was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Message {
    /// Create a new system message.
    pub fn system(content: &str) -> Self {
        Self {
            role: Role::System,
            content: content.to_string(),
            name: None,
            tool_call_id: None,
            tool_calls: None,
            timestamp: None,
        }
    }

    /// Create a new user message.
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            name: None,
            tool_call_id: None,
            tool_calls: None,
            timestamp: None,
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            name: None,
            tool_call_id: None,
            tool_calls: None,
            timestamp: None,
        }
    }

    /// Create an assistant message carrying tool calls.
    pub fn assistant_with_tools(content: &str, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            name: None,
            tool_call_id: None,
            tool_calls: Some(tool_calls),
            timestamp: None,
        }
    }

    /// Create a tool result message paired to the originating call.
    ///
    /// # Arguments
    /// * `tool_call_id` - ID of the tool call this responds to
    /// * `name` - Name of the tool that produced the result
    /// * `content` - Tool output text
    pub fn tool_result(tool_call_id: &str, name: &str, content: &str) -> Self {
        Self {
            role: Role::Tool,
            content: content.to_string(),
            name: Some(name.to_string()),
            tool_call_id: Some(tool_call_id.to_string()),
            tool_calls: None,
            timestamp: None,
        }
    }

    /// Stamp this message with a creation time.
    pub fn with_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// Check if this message carries any tool calls.
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls
            .as_ref()
            .map(|tc| !tc.is_empty())
            .unwrap_or(false)
    }

    /// Check if this is a tool result message.
    pub fn is_tool_result(&self) -> bool {
        self.role == Role::Tool && self.tool_call_id.is_some()
    }
}

/// A single function invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Type tag (always "function" on the current wire format)
    #[serde(rename = "type")]
    pub kind: String,
    /// Function name and serialized arguments
    pub function: FunctionCall,
}

/// Function name plus raw JSON arguments of a tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function to call
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}

impl ToolCall {
    /// Create a new function-type tool call.
    pub fn function(id: &str, name: &str, arguments: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(msg.tool_calls.is_none());
        assert!(msg.tool_call_id.is_none());

        let msg = Message::system("You are helpful");
        assert_eq!(msg.role, Role::System);

        let msg = Message::assistant("Hi there");
        assert_eq!(msg.role, Role::Assistant);
    }

    #[test]
    fn test_tool_result_pairing() {
        let msg = Message::tool_result("call_123", "search_records", "3 rows");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_123"));
        assert_eq!(msg.name.as_deref(), Some("search_records"));
        assert!(msg.is_tool_result());
    }

    #[test]
    fn test_assistant_with_tools() {
        let call = ToolCall::function("call_1", "list_objects", "{}");
        let msg = Message::assistant_with_tools("", vec![call]);
        assert!(msg.has_tool_calls());
        assert_eq!(msg.tool_calls.as_ref().unwrap()[0].kind, "function");
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&Role::Tool).unwrap();
        assert_eq!(json, r#""tool""#);
        let parsed: Role = serde_json::from_str(r#""assistant""#).unwrap();
        assert_eq!(parsed, Role::Assistant);
    }

    #[test]
    fn test_serialization_skips_none() {
        let msg = Message::user("Hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("tool_calls"));
        assert!(!json.contains("tool_call_id"));
        assert!(!json.contains("name"));
        assert!(!json.contains("timestamp"));
    }

    #[test]
    fn test_null_content_deserializes_empty() {
        let json = r#"{"role":"assistant","content":null,"tool_calls":[
            {"id":"call_1","type":"function","function":{"name":"get_record","arguments":"{\"id\":7}"}}
        ]}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.content, "");
        assert!(msg.has_tool_calls());
        assert_eq!(
            msg.tool_calls.as_ref().unwrap()[0].function.arguments,
            r#"{"id":7}"#
        );
    }

    #[test]
    fn test_missing_content_deserializes_empty() {
        let json = r#"{"role":"assistant"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.content, "");
        assert!(!msg.has_tool_calls());
    }

    #[test]
    fn test_timestamp_roundtrip() {
        let msg = Message::user("hi").with_timestamp(chrono::Utc::now());
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert!(parsed.timestamp.is_some());
    }
}
