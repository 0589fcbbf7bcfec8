//! Environment configuration for the generation assistant.

use std::time::Duration;

const DEFAULT_HOST: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "qwen3:32b";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for the local LLM endpoint.
///
/// Constructed once at startup and passed to whatever needs it; there is
/// no process-wide configuration singleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// Base URL of the Ollama server.
    pub host: String,
    /// Model name to request.
    pub model: String,
    /// Connect timeout in seconds. Reads stay unbounded for streaming.
    pub timeout_secs: u64,
}

impl LlmConfig {
    /// Read configuration from `STORY_OLLAMA_HOST`, `STORY_MODEL`, and
    /// `STORY_LLM_TIMEOUT`, with defaults for any unset variable.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("STORY_OLLAMA_HOST")
                .unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            model: std::env::var("STORY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            timeout_secs: std::env::var("STORY_LLM_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}
