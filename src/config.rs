//! Agent configuration
//!
//! An explicit configuration struct passed into the orchestrator's
//! constructor. Tests inject arbitrary thresholds directly; production code
//! typically starts from [`AgentConfig::from_env`].

use std::env;

/// Default maximum context size in estimated tokens.
pub const DEFAULT_MAX_CONTEXT_TOKENS: usize = 100_000;
/// Compact when the estimate crosses this fraction of the maximum.
pub const DEFAULT_AUTO_COMPACT_THRESHOLD: f64 = 0.75;
/// Maximum model-call iterations per chat turn (step ceiling).
pub const DEFAULT_MAX_AGENT_STEPS: usize = 100;
/// Default model for both chat and summarization.
pub const DEFAULT_MODEL: &str = "nvidia-nemotron-3-nano-30b-a3b-mlx";

/// Configuration for the agent orchestrator and compactor.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum context window capacity in estimated tokens
    pub max_context_tokens: usize,
    /// Fraction of `max_context_tokens` that triggers auto-compaction
    pub auto_compact_threshold: f64,
    /// Step ceiling: maximum model-call iterations per request
    pub max_agent_steps: usize,
    /// Default chat model identifier
    pub model: String,
    /// Model used for summarizing compaction
    pub compact_model: String,
    /// Sampling temperature for chat calls
    pub temperature: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: DEFAULT_MAX_CONTEXT_TOKENS,
            auto_compact_threshold: DEFAULT_AUTO_COMPACT_THRESHOLD,
            max_agent_steps: DEFAULT_MAX_AGENT_STEPS,
            model: DEFAULT_MODEL.to_string(),
            compact_model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
        }
    }
}

impl AgentConfig {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    ///
    /// Recognized variables: `MAX_CONTEXT_TOKENS`, `AUTO_COMPACT_THRESHOLD`,
    /// `AGENT_MODEL`, `COMPACT_MODEL`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("MAX_CONTEXT_TOKENS") {
            if let Ok(parsed) = val.parse::<usize>() {
                config.max_context_tokens = parsed;
            }
        }
        if let Ok(val) = env::var("AUTO_COMPACT_THRESHOLD") {
            if let Ok(parsed) = val.parse::<f64>() {
                config.auto_compact_threshold = parsed;
            }
        }
        if let Ok(val) = env::var("AGENT_MODEL") {
            if !val.is_empty() {
                config.model = val;
            }
        }
        if let Ok(val) = env::var("COMPACT_MODEL") {
            if !val.is_empty() {
                config.compact_model = val;
            }
        }

        config
    }

    /// The token estimate above which auto-compaction kicks in.
    pub fn compact_trigger(&self) -> usize {
        (self.max_context_tokens as f64 * self.auto_compact_threshold) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.max_context_tokens, 100_000);
        assert_eq!(config.auto_compact_threshold, 0.75);
        assert_eq!(config.max_agent_steps, 100);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.compact_model, DEFAULT_MODEL);
    }

    #[test]
    fn test_compact_trigger() {
        let config = AgentConfig {
            max_context_tokens: 1000,
            auto_compact_threshold: 0.75,
            ..Default::default()
        };
        assert_eq!(config.compact_trigger(), 750);
    }

    #[test]
    fn test_injected_thresholds() {
        // Tests build the struct directly instead of touching process env
        let config = AgentConfig {
            max_context_tokens: 200,
            auto_compact_threshold: 0.5,
            max_agent_steps: 3,
            ..Default::default()
        };
        assert_eq!(config.compact_trigger(), 100);
        assert_eq!(config.max_agent_steps, 3);
    }
}
