//! Summarizing compaction
//!
//! Splits history into an archive window (summarized via a model call, then
//! discarded) and an active window (retained verbatim). The summary is folded
//! into the system message inside a delimited block; a later compaction
//! merges into that block instead of stacking a second one, so the system
//! message stays bounded across many cycles.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::conversation::{Message, Role};
use crate::error::{AgentError, Result};
use crate::llm::{ChatRequest, LlmProvider};

use super::estimate::estimate_tokens;
use super::micro::{micro_compact, truncate_at_boundary};
use super::ACTIVE_TOOL_RESULT_LIMIT;

/// Start marker of the summary block embedded in the system message.
const SUMMARY_BLOCK_START: &str = "--- CONVERSATION SUMMARY";
/// End marker of the summary block.
const SUMMARY_BLOCK_END: &str = "--- END SUMMARY ---";
/// The block's header line terminator; summary text begins right after it.
const SUMMARY_HEADER_END: &str = "---\n";

/// Conversations shorter than this are returned unchanged; every turn is
/// still relevant and there is no meaningful archive/active split.
const MIN_MESSAGES_TO_COMPACT: usize = 6;

/// A request to compact conversation history.
#[derive(Debug, Clone)]
pub struct CompactRequest {
    /// The full conversation, system message first when present
    pub messages: Vec<Message>,
    /// Optional free-text instruction for what the summary must preserve
    pub keep: Option<String>,
}

/// The result of a compaction.
#[derive(Debug, Clone)]
pub struct CompactResponse {
    /// The (possibly unchanged) resulting conversation
    pub messages: Vec<Message>,
    /// Token estimate before compaction
    pub tokens_before: usize,
    /// Token estimate after compaction; equals `tokens_before` when nothing
    /// was compacted
    pub tokens_after: usize,
}

/// Model-assisted conversation compactor.
pub struct Compactor {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

/// Base system prompt and any previous summary extracted from the system
/// message.
struct SystemParts {
    base_prompt: String,
    previous_summary: String,
}

impl Compactor {
    /// Create a compactor that summarizes with the given model.
    pub fn new(provider: Arc<dyn LlmProvider>, model: &str) -> Self {
        Self {
            provider,
            model: model.to_string(),
        }
    }

    /// Compact a conversation.
    ///
    /// Never panics past the caller. Benign no-op paths (too few messages,
    /// nothing to archive) return `Ok` with the input echoed and
    /// `tokens_after == tokens_before`. Cancellation and summarization
    /// failures return `Err`; the caller proceeds with its own, unchanged
    /// conversation.
    pub async fn compact(
        &self,
        req: CompactRequest,
        cancel: &CancellationToken,
    ) -> Result<CompactResponse> {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        let messages = req.messages;
        let tokens_before = estimate_tokens(&messages);

        if messages.len() < MIN_MESSAGES_TO_COMPACT {
            return Ok(CompactResponse {
                messages,
                tokens_before,
                tokens_after: tokens_before,
            });
        }

        // System message and any summary already embedded in it
        let system_idx = messages.iter().position(|m| m.role == Role::System);
        let parts = system_idx
            .map(|i| split_system_content(&messages[i].content))
            .unwrap_or(SystemParts {
                base_prompt: String::new(),
                previous_summary: String::new(),
            });

        // Retention cutoff: index of the second most-recent user message.
        // Fallbacks: the single most recent user message, then "keep
        // everything" (right after the system message, or the start).
        let mut cutoff = None;
        let mut last_user_idx = None;
        let mut user_count = 0;
        for i in (0..messages.len()).rev() {
            if messages[i].role == Role::User {
                user_count += 1;
                last_user_idx = Some(i);
                if user_count == 2 {
                    cutoff = Some(i);
                    break;
                }
            }
        }
        let cutoff = cutoff
            .or(last_user_idx)
            .unwrap_or_else(|| system_idx.map_or(0, |i| i + 1));

        // Nothing meaningful to archive
        let min_cutoff = system_idx.map_or(0, |i| i + 1);
        if cutoff <= min_cutoff {
            return Ok(CompactResponse {
                messages,
                tokens_before,
                tokens_after: tokens_before,
            });
        }

        let archive_start = system_idx.map_or(0, |i| i + 1);
        let to_archive = &messages[archive_start..cutoff];

        // Deep copy so truncation below cannot alias the caller's slice
        let mut active: Vec<Message> = messages[cutoff..].to_vec();

        // Even active tool results are bounded: one oversized recent result
        // must not defeat the whole compaction.
        for msg in &mut active {
            if msg.role == Role::Tool && msg.content.len() > ACTIVE_TOOL_RESULT_LIMIT {
                let omitted = msg.content.len() - ACTIVE_TOOL_RESULT_LIMIT;
                msg.content = format!(
                    "{}...[truncated active tool result: {} chars omitted]",
                    truncate_at_boundary(&msg.content, ACTIVE_TOOL_RESULT_LIMIT),
                    omitted
                );
            }
        }

        // Cheap pruning first, then render the archive to a flat transcript
        let pruned_archive = micro_compact(to_archive);
        let transcript = render_transcript(&pruned_archive);

        let prompt = build_summary_prompt(
            req.keep.as_deref(),
            &parts.previous_summary,
            &transcript,
        );

        debug!(
            archived = to_archive.len(),
            active = active.len(),
            "Requesting conversation summary"
        );

        let llm_req = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message::user(&prompt)],
            tools: vec![],
            temperature: 0.3,
        };

        let resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            resp = self.provider.chat(llm_req) => {
                resp.map_err(|e| AgentError::Compaction(format!("summarization failed: {}", e)))?
            }
        };

        let summary = resp
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();
        if summary.is_empty() {
            return Err(AgentError::Compaction(
                "empty summarization response".to_string(),
            ));
        }

        // Reassemble: new system message (base prompt + summary block),
        // then the active window verbatim
        let summary_tokens = summary.len() / 4;
        let saved_est = tokens_before.saturating_sub(summary_tokens + estimate_tokens(&active));

        let now = Utc::now();
        let system_content = format!(
            "{}\n\n{} (Saved ~{} tokens | Compacted: {}) ---\n{}\n{}",
            parts.base_prompt,
            SUMMARY_BLOCK_START,
            saved_est,
            now.format("%b %-d, %-I:%M %p"),
            summary,
            SUMMARY_BLOCK_END
        );

        let mut final_messages = vec![Message::system(&system_content).with_timestamp(now)];
        final_messages.extend(active);

        let tokens_after = estimate_tokens(&final_messages);
        info!(tokens_before, tokens_after, "Conversation compacted");

        Ok(CompactResponse {
            messages: final_messages,
            tokens_before,
            tokens_after,
        })
    }
}

/// Split a system message into its base prompt and any embedded summary.
///
/// When no summary block is present the whole content is the base prompt.
fn split_system_content(content: &str) -> SystemParts {
    let Some(block_start) = content.find(SUMMARY_BLOCK_START) else {
        return SystemParts {
            base_prompt: content.to_string(),
            previous_summary: String::new(),
        };
    };

    let mut parts = SystemParts {
        base_prompt: String::new(),
        previous_summary: String::new(),
    };

    if let Some(block_end) = content.find(SUMMARY_BLOCK_END) {
        if let Some(header_end) = content[block_start..].find(SUMMARY_HEADER_END) {
            let summary_from = block_start + header_end + SUMMARY_HEADER_END.len();
            if summary_from <= block_end {
                parts.previous_summary = content[summary_from..block_end].trim().to_string();
            }
        }
        parts.base_prompt = content[..block_start].trim().to_string();
    }

    parts
}

/// Render archived messages to a flat transcript: one `[role]: content` line
/// per message, annotating tool calls and tool results by name without their
/// full payloads.
fn render_transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for msg in messages {
        out.push_str(&format!("[{}]: {}\n", msg.role, msg.content));
        if let Some(tool_calls) = &msg.tool_calls {
            for tc in tool_calls {
                out.push_str(&format!("(Tool Call: {})\n", tc.function.name));
            }
        }
        if msg.role == Role::Tool {
            match msg.name.as_deref() {
                Some(name) if !name.is_empty() => {
                    out.push_str(&format!("(Tool Result: {})\n", name));
                }
                _ => out.push_str("(Tool Result)\n"),
            }
        }
    }
    out
}

/// Build the single-turn summarization prompt.
fn build_summary_prompt(keep: Option<&str>, previous_summary: &str, transcript: &str) -> String {
    let keep_instruction = keep
        .filter(|k| !k.is_empty())
        .map(|k| format!("\n\nIMPORTANT: Make sure to preserve details about: {}", k))
        .unwrap_or_default();

    let previous_section = if previous_summary.is_empty() {
        String::new()
    } else {
        format!(
            "\nPrevious Context Summary (incorporate this into your new summary):\n{}\n\n",
            previous_summary
        )
    };

    format!(
        "Summarize the following conversation history concisely.\n\
         This history will be removed from the prompt, so capture ALL critical state, decisions, and code references.\n\
         {}\n\n{}Recent Conversation to Archive:\n{}\n\n\
         Provide a concise, consolidated summary (2-4 paragraphs). Focus on:\n\
         - What has been accomplished\n\
         - Function definitions or code snippets active in context\n\
         - Errors encountered and resolutions\n",
        keep_instruction, previous_section, transcript
    )
}
