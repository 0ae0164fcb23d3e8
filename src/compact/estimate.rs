//! Token estimation
//!
//! Deliberately crude: 4 bytes of text per token, no tokenizer. The
//! auto-compact threshold math depends on this exact formula, so it must not
//! be "improved" without retuning the thresholds.

use crate::conversation::Message;

/// Estimate the token cost of a conversation.
///
/// Sums `content.len() / 4` per message plus `arguments.len() / 4` per tool
/// call. No side effects, no failure mode.
pub fn estimate_tokens(messages: &[Message]) -> usize {
    let mut total = 0;
    for msg in messages {
        total += msg.content.len() / 4;
        if let Some(tool_calls) = &msg.tool_calls {
            for tc in tool_calls {
                total += tc.function.arguments.len() / 4;
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Message, ToolCall};

    #[test]
    fn test_empty_conversation() {
        assert_eq!(estimate_tokens(&[]), 0);
    }

    #[test]
    fn test_single_short_message() {
        // 5 bytes / 4 = 1 (integer division)
        let msgs = vec![Message::user("Hello")];
        assert_eq!(estimate_tokens(&msgs), 1);
    }

    #[test]
    fn test_sums_all_messages() {
        let msgs = vec![
            Message::system(&"s".repeat(40)), // 10
            Message::user(&"u".repeat(8)),    // 2
            Message::assistant(&"a".repeat(3)), // 0
        ];
        assert_eq!(estimate_tokens(&msgs), 12);
    }

    #[test]
    fn test_counts_tool_call_arguments() {
        let args = "x".repeat(40); // 10 tokens
        let msgs = vec![Message::assistant_with_tools(
            "calling", // 7 bytes -> 1 token
            vec![
                ToolCall::function("c1", "tool_a", &args),
                ToolCall::function("c2", "tool_b", &args),
            ],
        )];
        assert_eq!(estimate_tokens(&msgs), 1 + 10 + 10);
    }
}
