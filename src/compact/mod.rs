//! Conversation compaction
//!
//! Two strategies keep a long-running conversation inside its token budget:
//!
//! - **Micro-compaction** ([`micro_compact`]): single-pass, model-free
//!   truncation of verbose tool arguments and results. Structure-preserving,
//!   content-lossy, never errors.
//! - **Summarizing compaction** ([`Compactor`]): splits history into an
//!   archive window and an active window, summarizes the archive with a model
//!   call, and folds the summary into the system message — merging with any
//!   prior summary so the system message stays bounded across cycles.
//!
//! [`estimate_tokens`] is the shared heuristic both the compactor and the
//! orchestrator's auto-compact check use.

mod estimate;
mod micro;
mod summarize;

pub use estimate::estimate_tokens;
pub use micro::micro_compact;
pub use summarize::{CompactRequest, CompactResponse, Compactor};

/// Maximum length of tool arguments/results in the archive window before
/// truncation.
pub const ARCHIVE_TOOL_RESULT_LIMIT: usize = 500;

/// Maximum length of tool results kept in the active window. Larger than the
/// archive limit because recent results are what the model is reasoning
/// about, but still bounded so one oversized result cannot defeat compaction.
pub const ACTIVE_TOOL_RESULT_LIMIT: usize = 2000;

/// Marker appended to micro-compacted payloads.
pub const TRUNCATION_MARKER: &str = "...[truncated]";
