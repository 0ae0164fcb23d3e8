//! Pinned-context store
//!
//! Per-session files pinned into the system prompt at the start of a turn.
//! The store is the only resource shared across concurrent agent requests and
//! is guarded by a reader/writer lock. Mutations persist to disk best-effort
//! in a background task; `flush` is the synchronous path and the only
//! durability guarantee ("eventually written") tests should rely on.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::warn;

use crate::error::Result;

/// A file pinned into a session's context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextItem {
    /// Source path of the pinned file
    pub path: String,
    /// Full file content injected into the system prompt
    pub content: String,
    /// Estimated token cost (content bytes / 4, same heuristic as the
    /// conversation estimator)
    pub token_size: usize,
}

type Sessions = HashMap<String, HashMap<String, ContextItem>>;

/// Pinned-context storage across sessions.
pub struct ContextStore {
    sessions: RwLock<Sessions>,
    file_path: Option<PathBuf>,
}

impl ContextStore {
    /// Open a store, loading prior state from `file_path` when it exists.
    ///
    /// A missing or unreadable state file starts the store empty; pinned
    /// context is a cache, not a system of record.
    pub fn new(file_path: Option<PathBuf>) -> Arc<Self> {
        let sessions = file_path
            .as_ref()
            .and_then(|p| std::fs::read(p).ok())
            .and_then(|data| serde_json::from_slice::<Sessions>(&data).ok())
            .unwrap_or_default();

        Arc::new(Self {
            sessions: RwLock::new(sessions),
            file_path,
        })
    }

    /// An in-memory store with no persistence.
    pub fn new_memory() -> Arc<Self> {
        Self::new(None)
    }

    /// List all items pinned in a session.
    pub async fn list_items(&self, session_id: &str) -> Vec<ContextItem> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Pin content into a session's context, replacing any item with the
    /// same path.
    pub async fn add_item(self: &Arc<Self>, session_id: &str, path: &str, content: &str) {
        {
            let mut sessions = self.sessions.write().await;
            let items = sessions.entry(session_id.to_string()).or_default();
            items.insert(
                path.to_string(),
                ContextItem {
                    path: path.to_string(),
                    content: content.to_string(),
                    token_size: content.len() / 4,
                },
            );
        }
        self.spawn_save();
    }

    /// Remove one pinned item from a session.
    pub async fn remove_item(self: &Arc<Self>, session_id: &str, path: &str) {
        {
            let mut sessions = self.sessions.write().await;
            if let Some(items) = sessions.get_mut(session_id) {
                items.remove(path);
            }
        }
        self.spawn_save();
    }

    /// Remove every pinned item from a session.
    pub async fn clear_session(self: &Arc<Self>, session_id: &str) {
        {
            let mut sessions = self.sessions.write().await;
            sessions.remove(session_id);
        }
        self.spawn_save();
    }

    /// Estimated token total of a session's pinned context.
    pub async fn total_tokens(&self, session_id: &str) -> usize {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .map(|items| items.values().map(|i| i.token_size).sum())
            .unwrap_or(0)
    }

    /// Write the current state to disk now.
    pub async fn flush(&self) -> Result<()> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };
        let data = {
            let sessions = self.sessions.read().await;
            serde_json::to_vec_pretty(&*sessions)?
        };
        tokio::fs::write(path, data).await?;
        Ok(())
    }

    /// Best-effort background save. The mutating caller never blocks on disk;
    /// a crash may lose the very last unpersisted mutation.
    fn spawn_save(self: &Arc<Self>) {
        if self.file_path.is_none() {
            return;
        }
        let store = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = store.flush().await {
                warn!(error = %e, "Failed to persist context store");
            }
        });
    }
}
