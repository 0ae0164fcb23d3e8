//! Agent loop implementation
//!
//! One [`AgentLoop::chat_stream`] call drives one chat turn end to end and
//! owns the working conversation for its whole duration. Progress is streamed
//! through the caller's channel; the sender is moved in and dropped on every
//! exit path, so the channel closes exactly once.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::compact::{estimate_tokens, CompactRequest, Compactor};
use crate::config::AgentConfig;
use crate::contextstore::{ContextItem, ContextStore};
use crate::conversation::{Message, Role};
use crate::llm::{ChatRequest, LlmProvider, Tool};
use crate::toolbus::ToolBus;

use super::events::StreamEvent;

/// Marker used to detect pinned context already present in a system prompt,
/// making injection idempotent across turns.
const CONTEXT_HEADER: &str = "ACTIVE CONTEXT FILES";

/// User-facing text emitted when the step ceiling is exhausted.
const STEP_CEILING_APOLOGY: &str = "I apologize, but I was unable to complete the request within \
                                    the step limit. Please try a simpler request.";

/// One chat turn submitted by a caller.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurnRequest {
    /// Model override; the configured default when absent or empty
    #[serde(default)]
    pub model: Option<String>,
    /// Conversation so far, ending with the newest user message
    pub messages: Vec<Message>,
    /// Session whose pinned context should be injected
    #[serde(default)]
    pub session_id: Option<String>,
}

/// The agent orchestrator.
///
/// Holds the collaborators one chat turn needs. Requests are independent:
/// each `chat_stream` call owns its message list exclusively, and the pinned
/// context store is the only resource shared across concurrent requests.
pub struct AgentLoop {
    provider: Arc<dyn LlmProvider>,
    tool_bus: Arc<dyn ToolBus>,
    context_store: Arc<ContextStore>,
    compactor: Compactor,
    config: AgentConfig,
}

impl AgentLoop {
    /// Create a new agent loop.
    ///
    /// The summarizing compactor is built internally, sharing `provider` and
    /// using `config.compact_model`.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tool_bus: Arc<dyn ToolBus>,
        context_store: Arc<ContextStore>,
        config: AgentConfig,
    ) -> Self {
        let compactor = Compactor::new(Arc::clone(&provider), &config.compact_model);
        Self {
            provider,
            tool_bus,
            context_store,
            compactor,
            config,
        }
    }

    /// Process one chat turn, streaming progress into `events`.
    ///
    /// Emits events in strict chronological order and closes the channel on
    /// return. Terminates with exactly one `Done` or `Error` event unless the
    /// request is cancelled, in which case the stream simply ends.
    pub async fn chat_stream(
        &self,
        req: ChatTurnRequest,
        events: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) {
        let span = info_span!("request", request_id = %Uuid::new_v4());
        self.run(req, events, cancel).instrument(span).await;
    }

    async fn run(
        &self,
        req: ChatTurnRequest,
        events: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) {
        // Tool catalog. Failure here is fatal to the request.
        let specs = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            specs = self.tool_bus.list_tools() => match specs {
                Ok(specs) => specs,
                Err(e) => {
                    emit(
                        &events,
                        &cancel,
                        StreamEvent::Error {
                            content: format!("Failed to list tools: {}", e),
                        },
                    )
                    .await;
                    return;
                }
            },
        };
        let tools: Vec<Tool> = specs
            .into_iter()
            .map(|spec| Tool::function(&spec.name, &spec.description, spec.input_schema))
            .collect();

        let model = req
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.config.model.clone());

        // Pinned context for this session, if any
        let injection = match req.session_id.as_deref().filter(|s| !s.is_empty()) {
            Some(session_id) => context_injection(&self.context_store.list_items(session_id).await),
            None => String::new(),
        };

        let mut messages = req.messages;
        prepare_system_prompt(&mut messages, &injection);

        info!(
            model = %model,
            tools = tools.len(),
            messages = messages.len(),
            "Starting chat turn"
        );

        // Auto-compact when the estimate crosses the threshold. Failure is
        // never fatal; the turn proceeds with the uncompacted conversation.
        let token_count = estimate_tokens(&messages);
        if token_count > self.config.compact_trigger() {
            debug!(
                tokens = token_count,
                trigger = self.config.compact_trigger(),
                "Context over threshold, compacting"
            );
            let compact_req = CompactRequest {
                messages: messages.clone(),
                keep: None,
            };
            match self.compactor.compact(compact_req, &cancel).await {
                Ok(resp) if resp.tokens_after < resp.tokens_before => {
                    messages = resp.messages;
                    let ok = emit(
                        &events,
                        &cancel,
                        StreamEvent::AutoCompact {
                            content: format!(
                                "Context auto-compacted: {} → {} tokens",
                                resp.tokens_before, resp.tokens_after
                            ),
                            tokens_before: resp.tokens_before,
                            tokens_after: resp.tokens_after,
                        },
                    )
                    .await;
                    if !ok {
                        return;
                    }
                }
                Ok(_) => {}
                Err(e) if e.is_cancelled() => return,
                Err(e) => {
                    warn!(error = %e, "Auto-compaction failed, continuing uncompacted");
                }
            }
        }

        for step in 0..self.config.max_agent_steps {
            debug!(step, "Calling model");
            let llm_req = ChatRequest {
                model: model.clone(),
                messages: messages.clone(),
                tools: tools.clone(),
                temperature: self.config.temperature,
            };

            let resp = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                resp = self.provider.chat(llm_req) => match resp {
                    Ok(resp) => resp,
                    Err(e) => {
                        emit(
                            &events,
                            &cancel,
                            StreamEvent::Error {
                                content: format!("LLM error: {}", e),
                            },
                        )
                        .await;
                        return;
                    }
                },
            };

            let Some(choice) = resp.choices.into_iter().next() else {
                emit(
                    &events,
                    &cancel,
                    StreamEvent::Error {
                        content: "Empty response from model".to_string(),
                    },
                )
                .await;
                return;
            };

            let assistant_msg = choice.message.with_timestamp(Utc::now());
            let tool_calls = assistant_msg.tool_calls.clone().unwrap_or_default();
            messages.push(assistant_msg);

            if tool_calls.is_empty() {
                // Final answer
                let content = messages
                    .last()
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                if !emit(&events, &cancel, StreamEvent::Content { content }).await {
                    return;
                }
                emit(&events, &cancel, StreamEvent::Done { history: messages }).await;
                return;
            }

            // Execute the requested tools strictly in the order the model
            // listed them, pairing each result before the next call runs
            for tc in tool_calls {
                let ok = emit(
                    &events,
                    &cancel,
                    StreamEvent::ToolCall {
                        tool_name: tc.function.name.clone(),
                        tool_call_id: tc.id.clone(),
                        tool_args: tc.function.arguments.clone(),
                    },
                )
                .await;
                if !ok {
                    return;
                }

                info!(tool = %tc.function.name, id = %tc.id, "Executing tool");
                let (tool_output, is_error) = match serde_json::from_str::<Value>(
                    &tc.function.arguments,
                ) {
                    Err(e) => (format!("Error: invalid tool arguments: {}", e), true),
                    Ok(args) => {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => return,
                            result = self.tool_bus.call_tool(&tc.function.name, args) => {
                                match result {
                                    Ok(result) => (result.text_content(), result.is_error),
                                    Err(e) => (format!("Error: {}", e), true),
                                }
                            }
                        }
                    }
                };

                let ok = emit(
                    &events,
                    &cancel,
                    StreamEvent::ToolResult {
                        tool_name: tc.function.name.clone(),
                        tool_call_id: tc.id.clone(),
                        tool_result: tool_output.clone(),
                        is_error,
                    },
                )
                .await;
                if !ok {
                    return;
                }

                messages.push(
                    Message::tool_result(&tc.id, &tc.function.name, &tool_output)
                        .with_timestamp(Utc::now()),
                );
            }
        }

        // Step ceiling exhausted: soft termination, not an error
        info!(steps = self.config.max_agent_steps, "Step ceiling reached");
        if !emit(
            &events,
            &cancel,
            StreamEvent::Content {
                content: STEP_CEILING_APOLOGY.to_string(),
            },
        )
        .await
        {
            return;
        }
        emit(&events, &cancel, StreamEvent::Done { history: messages }).await;
    }
}

/// Send one event, respecting cancellation. Returns `false` when the loop
/// must stop (consumer gone or request cancelled).
async fn emit(
    events: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
    event: StreamEvent,
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = events.send(event) => sent.is_ok(),
    }
}

/// The default system prompt, carrying the current date.
fn base_system_prompt() -> String {
    let mut prompt = format!(
        "You are Nexus, an AI assistant for NexusCRM. Today is {}.\n",
        Utc::now().format("%A, %B %-d, %Y")
    );
    prompt.push_str("\nPRINCIPLES:");
    prompt.push_str(
        "\n1. EXPLORE BEFORE ACTING - Like exploring a new codebase, first understand what's \
         available, then dive into specifics.",
    );
    prompt.push_str(
        "\n2. TREE EXPLORATION - Start broad (list all), then narrow down (get details), then \
         act (CRUD). Don't try to do everything at once.",
    );
    prompt.push_str(
        "\n\nYou have access to a dynamic CRM system. Objects and fields are metadata-driven. \
         Think step by step. If a tool fails, read the error and adapt.",
    );
    prompt
}

/// Render pinned context items to the injection block appended to the system
/// prompt. Empty when there is nothing pinned.
fn context_injection(items: &[ContextItem]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let mut out = format!("\n\n{} (Priority over general knowledge):\n", CONTEXT_HEADER);
    for item in items {
        out.push_str(&format!(
            "\n--- FILE: {} ---\n{}\n--- END FILE ---\n",
            item.path, item.content
        ));
    }
    out
}

/// Ensure the conversation starts with a system message carrying the pinned
/// context. Synthesizes one when absent; otherwise appends the injection only
/// if no context block is present yet.
fn prepare_system_prompt(messages: &mut Vec<Message>, injection: &str) {
    if messages.first().map(|m| m.role) != Some(Role::System) {
        let mut prompt = base_system_prompt();
        prompt.push_str(injection);
        messages.insert(0, Message::system(&prompt).with_timestamp(Utc::now()));
    } else if !injection.is_empty() && !messages[0].content.contains(CONTEXT_HEADER) {
        messages[0].content.push_str(injection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesizes_system_message() {
        let mut messages = vec![Message::user("hi")];
        prepare_system_prompt(&mut messages, "");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.starts_with("You are Nexus"));
        assert!(messages[0].timestamp.is_some());
    }

    #[test]
    fn test_injection_appended_to_synthesized_prompt() {
        let items = vec![ContextItem {
            path: "/notes.md".to_string(),
            content: "remember the Acme deal".to_string(),
            token_size: 5,
        }];
        let injection = context_injection(&items);
        let mut messages = vec![Message::user("hi")];
        prepare_system_prompt(&mut messages, &injection);
        assert!(messages[0].content.contains(CONTEXT_HEADER));
        assert!(messages[0].content.contains("--- FILE: /notes.md ---"));
        assert!(messages[0].content.contains("remember the Acme deal"));
    }

    #[test]
    fn test_injection_is_idempotent() {
        let items = vec![ContextItem {
            path: "/a".to_string(),
            content: "pinned".to_string(),
            token_size: 1,
        }];
        let injection = context_injection(&items);

        let mut messages = vec![Message::system("existing prompt"), Message::user("hi")];
        prepare_system_prompt(&mut messages, &injection);
        let once = messages[0].content.clone();

        prepare_system_prompt(&mut messages, &injection);
        assert_eq!(messages[0].content, once);
        assert_eq!(once.matches(CONTEXT_HEADER).count(), 1);
    }

    #[test]
    fn test_existing_system_message_kept_without_injection() {
        let mut messages = vec![Message::system("custom"), Message::user("hi")];
        prepare_system_prompt(&mut messages, "");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "custom");
    }

    #[test]
    fn test_empty_context_injection() {
        assert!(context_injection(&[]).is_empty());
    }
}
