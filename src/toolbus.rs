//! Tool bus interface
//!
//! The tool bus is the external registry/dispatcher of callable tools (record
//! CRUD, schema queries, context management, ...). The orchestrator only
//! depends on this trait: it lists the catalog once per request and invokes
//! tools by name as the model asks for them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A tool advertised by the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool name
    pub name: String,
    /// Human-readable description forwarded to the model
    pub description: String,
    /// JSON Schema of the tool's arguments
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolSpec {
    pub fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// One block of tool output. Only `text`-type blocks are forwarded to the
/// model; other kinds are ignored by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolContent {
    /// Content type tag ("text")
    #[serde(rename = "type")]
    pub kind: String,
    /// The text payload
    #[serde(default)]
    pub text: String,
}

impl ToolContent {
    pub fn text(text: &str) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.to_string(),
        }
    }
}

/// Result of one tool invocation.
///
/// A tool-level failure is reported in-band (`is_error: true`) rather than as
/// a transport error, so the model gets a chance to read the error and adapt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Output blocks, in order
    pub content: Vec<ToolContent>,
    /// Whether the tool reported a failure
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl ToolResult {
    /// A successful single-text result.
    pub fn text(text: &str) -> Self {
        Self {
            content: vec![ToolContent::text(text)],
            is_error: false,
        }
    }

    /// An error result the model can react to.
    pub fn error(text: &str) -> Self {
        Self {
            content: vec![ToolContent::text(text)],
            is_error: true,
        }
    }

    /// Concatenate all text blocks, one per line.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for block in &self.content {
            if block.kind == "text" {
                out.push_str(&block.text);
                out.push('\n');
            }
        }
        out
    }
}

/// The tool catalog and dispatcher the orchestrator talks to.
#[async_trait]
pub trait ToolBus: Send + Sync {
    /// List the available tools.
    async fn list_tools(&self) -> Result<Vec<ToolSpec>>;

    /// Invoke a tool by name with JSON arguments.
    ///
    /// Transport-level failures return `Err`; tool-level failures return
    /// `Ok` with `is_error` set.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_text_content() {
        let result = ToolResult {
            content: vec![
                ToolContent::text("row 1"),
                ToolContent {
                    kind: "image".to_string(),
                    text: "ignored".to_string(),
                },
                ToolContent::text("row 2"),
            ],
            is_error: false,
        };
        assert_eq!(result.text_content(), "row 1\nrow 2\n");
    }

    #[test]
    fn test_tool_result_error() {
        let result = ToolResult::error("no such record");
        assert!(result.is_error);
        assert_eq!(result.text_content(), "no such record\n");
    }

    #[test]
    fn test_tool_spec_serde() {
        let spec = ToolSpec::new(
            "get_record",
            "Fetch one record by id",
            serde_json::json!({"type": "object", "required": ["id"]}),
        );
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("inputSchema"));
        let parsed: ToolSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name, "get_record");
    }

    #[test]
    fn test_tool_result_default_is_error() {
        let json = r#"{"content": [{"type": "text", "text": "ok"}]}"#;
        let result: ToolResult = serde_json::from_str(json).unwrap();
        assert!(!result.is_error);
    }
}
