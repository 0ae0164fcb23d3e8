//! Micro-compaction
//!
//! Cheap first-pass pruning applied to the archive window before it is
//! summarized. Prunes verbose tool payloads while keeping every message, its
//! role, and the call/result pairing intact. No model calls, deterministic,
//! never errors.

use crate::conversation::{FunctionCall, Message, Role, ToolCall};

use super::{ARCHIVE_TOOL_RESULT_LIMIT, TRUNCATION_MARKER};

/// Cut `s` at `limit` bytes, backing off to a char boundary.
pub(crate) fn truncate_at_boundary(s: &str, limit: usize) -> &str {
    if s.len() <= limit {
        return s;
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Prune verbose tool call arguments and tool results.
///
/// Returns a new conversation of equal length and role sequence:
///
/// - tool call arguments longer than [`ARCHIVE_TOOL_RESULT_LIMIT`] are cut
///   and marked; id, type, and function name are copied verbatim
/// - `tool`-role content longer than the same limit is cut and marked
/// - `user` and `assistant` content is never touched, regardless of length
pub fn micro_compact(messages: &[Message]) -> Vec<Message> {
    let mut result = Vec::with_capacity(messages.len());

    for msg in messages {
        let mut new_msg = msg.clone();

        if let Some(tool_calls) = &msg.tool_calls {
            new_msg.tool_calls = Some(
                tool_calls
                    .iter()
                    .map(|tc| {
                        let args = &tc.function.arguments;
                        let arguments = if args.len() > ARCHIVE_TOOL_RESULT_LIMIT {
                            format!(
                                "{}{}",
                                truncate_at_boundary(args, ARCHIVE_TOOL_RESULT_LIMIT),
                                TRUNCATION_MARKER
                            )
                        } else {
                            args.clone()
                        };
                        ToolCall {
                            id: tc.id.clone(),
                            kind: tc.kind.clone(),
                            function: FunctionCall {
                                name: tc.function.name.clone(),
                                arguments,
                            },
                        }
                    })
                    .collect(),
            );
        }

        if msg.role == Role::Tool && msg.content.len() > ARCHIVE_TOOL_RESULT_LIMIT {
            new_msg.content = format!(
                "{}{}",
                truncate_at_boundary(&msg.content, ARCHIVE_TOOL_RESULT_LIMIT),
                TRUNCATION_MARKER
            );
        }

        result.push(new_msg);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Message, Role, ToolCall};

    #[test]
    fn test_preserves_count_and_roles() {
        let msgs = vec![
            Message::system("sys"),
            Message::user("u"),
            Message::assistant("a"),
            Message::tool_result("c1", "t", "r"),
        ];
        let result = micro_compact(&msgs);
        assert_eq!(result.len(), msgs.len());
        for (before, after) in msgs.iter().zip(&result) {
            assert_eq!(before.role, after.role);
        }
    }

    #[test]
    fn test_truncates_long_tool_result() {
        let msgs = vec![Message::tool_result("c1", "query", &"x".repeat(1000))];
        let result = micro_compact(&msgs);
        assert_eq!(
            result[0].content.len(),
            ARCHIVE_TOOL_RESULT_LIMIT + TRUNCATION_MARKER.len()
        );
        assert!(result[0].content.ends_with(TRUNCATION_MARKER));
        // Pairing metadata survives
        assert_eq!(result[0].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(result[0].name.as_deref(), Some("query"));
    }

    #[test]
    fn test_short_tool_result_untouched() {
        let content = "x".repeat(ARCHIVE_TOOL_RESULT_LIMIT);
        let msgs = vec![Message::tool_result("c1", "query", &content)];
        let result = micro_compact(&msgs);
        assert_eq!(result[0].content, content);
    }

    #[test]
    fn test_never_truncates_user_or_assistant() {
        let long = "y".repeat(5000);
        let msgs = vec![Message::user(&long), Message::assistant(&long)];
        let result = micro_compact(&msgs);
        assert_eq!(result[0].content, long);
        assert_eq!(result[1].content, long);
    }

    #[test]
    fn test_truncates_long_tool_call_arguments() {
        let args = "a".repeat(800);
        let msgs = vec![Message::assistant_with_tools(
            "",
            vec![ToolCall::function("call_1", "bulk_update", &args)],
        )];
        let result = micro_compact(&msgs);
        let tc = &result[0].tool_calls.as_ref().unwrap()[0];
        assert_eq!(tc.id, "call_1");
        assert_eq!(tc.function.name, "bulk_update");
        assert_eq!(
            tc.function.arguments.len(),
            ARCHIVE_TOOL_RESULT_LIMIT + TRUNCATION_MARKER.len()
        );
    }

    #[test]
    fn test_arguments_at_limit_untouched() {
        let args = "a".repeat(ARCHIVE_TOOL_RESULT_LIMIT);
        let msgs = vec![Message::assistant_with_tools(
            "",
            vec![ToolCall::function("call_1", "t", &args)],
        )];
        let result = micro_compact(&msgs);
        assert_eq!(
            result[0].tool_calls.as_ref().unwrap()[0].function.arguments,
            args
        );
    }

    #[test]
    fn test_multibyte_boundary() {
        // Build a tool result of multi-byte chars crossing the limit
        let content = "é".repeat(400); // 800 bytes
        let msgs = vec![Message::tool_result("c1", "t", &content)];
        let result = micro_compact(&msgs);
        assert!(result[0].content.ends_with(TRUNCATION_MARKER));
        // Valid UTF-8 and not longer than limit + marker
        assert!(result[0].content.len() <= ARCHIVE_TOOL_RESULT_LIMIT + TRUNCATION_MARKER.len());
    }

    #[test]
    fn test_role_tool() {
        let msgs = vec![Message::tool_result("c1", "t", "short")];
        let result = micro_compact(&msgs);
        assert_eq!(result[0].role, Role::Tool);
        assert_eq!(result[0].content, "short");
    }
}
