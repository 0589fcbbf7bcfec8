//! Minimal Ollama chat API client.
//!
//! This crate provides a focused client for Ollama's chat endpoint with:
//! - Non-streaming and streaming completions
//! - A cached availability probe for graceful degradation
//! - Newline-delimited JSON parsing for streaming responses

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_stream::Stream;

const DEFAULT_HOST: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "qwen3:32b";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur when using the Ollama client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Ollama is not available at: {host}")]
    Unavailable { host: String },

    #[error("Ollama connection timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl Error {
    /// Whether the caller can recover by degrading gracefully
    /// (skipping the AI feature) rather than failing the operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Unavailable { .. } | Error::Timeout { .. })
    }
}

// Availability cache states.
const AVAILABILITY_UNKNOWN: u8 = 0;
const AVAILABILITY_UP: u8 = 1;
const AVAILABILITY_DOWN: u8 = 2;

/// Ollama API client.
///
/// The HTTP client enforces a connect timeout but no read timeout:
/// streaming generation can legitimately take minutes.
#[derive(Clone)]
pub struct Ollama {
    client: reqwest::Client,
    host: String,
    model: String,
    connect_timeout: Duration,
    available: Arc<AtomicU8>,
}

impl Ollama {
    /// Create a new client for the given base URL.
    pub fn new(host: impl Into<String>) -> Self {
        let connect_timeout = Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS);
        Self {
            client: build_http_client(connect_timeout),
            host: normalize_host(host.into()),
            model: DEFAULT_MODEL.to_string(),
            connect_timeout,
            available: Arc::new(AtomicU8::new(AVAILABILITY_UNKNOWN)),
        }
    }

    /// Create a client from `STORY_OLLAMA_HOST`, `STORY_MODEL`, and
    /// `STORY_LLM_TIMEOUT` environment variables, with defaults for any
    /// that are unset.
    pub fn from_env() -> Self {
        let host =
            std::env::var("STORY_OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let model = std::env::var("STORY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let timeout = std::env::var("STORY_LLM_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        Self::new(host)
            .with_model(model)
            .with_connect_timeout(Duration::from_secs(timeout))
    }

    /// Set the default model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the connect timeout (read remains unbounded).
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self.client = build_http_client(timeout);
        self
    }

    /// The base URL this client talks to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The default model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Check whether the server responds, caching the result per process.
    ///
    /// Uses a lightweight `GET /api/tags` bounded by the connect timeout.
    pub async fn is_available(&self) -> bool {
        match self.available.load(Ordering::Relaxed) {
            AVAILABILITY_UP => return true,
            AVAILABILITY_DOWN => return false,
            _ => {}
        }

        let up = match self
            .client
            .get(format!("{}/api/tags", self.host))
            .timeout(self.connect_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        };

        self.available.store(
            if up { AVAILABILITY_UP } else { AVAILABILITY_DOWN },
            Ordering::Relaxed,
        );
        up
    }

    /// Clear the cached availability status so the next check probes again.
    pub fn reset_availability(&self) {
        self.available.store(AVAILABILITY_UNKNOWN, Ordering::Relaxed);
    }

    /// Send a chat request and return the complete response text.
    pub async fn chat(&self, request: ChatRequest) -> Result<String, Error> {
        if !self.is_available().await {
            return Err(Error::Unavailable {
                host: self.host.clone(),
            });
        }

        let payload = self.build_payload(&request, false);
        let response = self
            .client
            .post(format!("{}/api/chat", self.host))
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.classify_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let body: ApiChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(body.message.map(|m| m.content).unwrap_or_default())
    }

    /// Send a chat request and stream the response text incrementally.
    ///
    /// Ollama streams newline-delimited JSON chunks, each carrying a
    /// `message.content` fragment.
    pub async fn chat_stream(
        &self,
        request: ChatRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<String, Error>> + Send>>, Error> {
        if !self.is_available().await {
            return Err(Error::Unavailable {
                host: self.host.clone(),
            });
        }

        let payload = self.build_payload(&request, true);
        let response = self
            .client
            .post(format!("{}/api/chat", self.host))
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.classify_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        // Use scan to maintain a buffer for lines split across network reads
        let stream = response
            .bytes_stream()
            .scan(String::new(), |buffer, result| {
                let chunks = match result {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        parse_ndjson_buffered(buffer)
                    }
                    Err(e) => vec![Err(Error::Network(e.to_string()))],
                };
                futures::future::ready(Some(chunks))
            })
            .flat_map(futures::stream::iter);

        Ok(Box::pin(stream))
    }

    fn build_payload(&self, request: &ChatRequest, stream: bool) -> ApiRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(ApiMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        for message in &request.messages {
            messages.push(ApiMessage {
                role: message.role.as_str().to_string(),
                content: message.content.clone(),
            });
        }

        ApiRequest {
            model: request.model.clone().unwrap_or_else(|| self.model.clone()),
            messages,
            stream,
        }
    }

    fn classify_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::Timeout {
                seconds: self.connect_timeout.as_secs(),
            }
        } else if error.is_connect() {
            self.available.store(AVAILABILITY_DOWN, Ordering::Relaxed);
            Error::Unavailable {
                host: self.host.clone(),
            }
        } else {
            Error::Network(error.to_string())
        }
    }
}

fn build_http_client(connect_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .expect("Failed to build HTTP client")
}

fn normalize_host(host: String) -> String {
    host.trim_end_matches('/').to_string()
}

// ============================================================================
// Public types
// ============================================================================

/// A chat request to send to Ollama.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: Option<String>,
    pub system: Option<String>,
    pub messages: Vec<Message>,
}

impl ChatRequest {
    /// Create a new request with the given messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            model: None,
            system: None,
            messages,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// A message in the conversation.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }

    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiChatResponse {
    #[serde(default)]
    message: Option<ApiResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: String,
}

/// Parse complete NDJSON lines from a buffer, leaving any trailing partial
/// line for the next network read.
///
/// Malformed lines are skipped rather than surfaced; empty content
/// fragments (keep-alives, the final `done` chunk) are filtered out.
fn parse_ndjson_buffered(buffer: &mut String) -> Vec<Result<String, Error>> {
    let mut chunks = Vec::new();

    while let Some(newline_pos) = buffer.find('\n') {
        let line = buffer[..newline_pos].trim().to_string();
        buffer.drain(..=newline_pos);

        if line.is_empty() {
            continue;
        }

        if let Ok(chunk) = serde_json::from_str::<ApiChatResponse>(&line) {
            let content = chunk.message.map(|m| m.content).unwrap_or_default();
            if !content.is_empty() {
                chunks.push(Ok(content));
            }
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = Ollama::new("http://localhost:11434");
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.host(), "http://localhost:11434");
    }

    #[test]
    fn test_client_with_model() {
        let client = Ollama::new(DEFAULT_HOST).with_model("llama3:8b");
        assert_eq!(client.model(), "llama3:8b");
    }

    #[test]
    fn test_host_trailing_slash_stripped() {
        let client = Ollama::new("http://localhost:11434/");
        assert_eq!(client.host(), "http://localhost:11434");
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new(vec![Message::user("Hello")])
            .with_system("You are a helpful assistant")
            .with_model("llama3:8b");

        assert_eq!(request.messages.len(), 1);
        assert!(request.system.is_some());
        assert_eq!(request.model.as_deref(), Some("llama3:8b"));
    }

    #[test]
    fn test_message_creation() {
        let user_msg = Message::user("Hello");
        assert!(matches!(user_msg.role, Role::User));

        let assistant_msg = Message::assistant("Hi there");
        assert!(matches!(assistant_msg.role, Role::Assistant));
    }

    #[test]
    fn test_system_prompt_prepended() {
        let client = Ollama::new(DEFAULT_HOST);
        let request = ChatRequest::new(vec![Message::user("Hi")]).with_system("Be brief");
        let payload = client.build_payload(&request, false);

        assert_eq!(payload.messages.len(), 2);
        assert_eq!(payload.messages[0].role, "system");
        assert_eq!(payload.messages[0].content, "Be brief");
        assert_eq!(payload.messages[1].role, "user");
        assert!(!payload.stream);
    }

    #[test]
    fn test_parse_ndjson_complete_lines() {
        let mut buffer = String::from(
            "{\"message\":{\"content\":\"Hel\"}}\n{\"message\":{\"content\":\"lo\"}}\n",
        );
        let chunks = parse_ndjson_buffered(&mut buffer);

        let texts: Vec<_> = chunks.into_iter().map(|c| c.unwrap()).collect();
        assert_eq!(texts, vec!["Hel", "lo"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_parse_ndjson_partial_line_retained() {
        let mut buffer = String::from("{\"message\":{\"content\":\"a\"}}\n{\"mess");
        let chunks = parse_ndjson_buffered(&mut buffer);

        assert_eq!(chunks.len(), 1);
        assert_eq!(buffer, "{\"mess");

        // Completing the line yields the second chunk
        buffer.push_str("age\":{\"content\":\"b\"}}\n");
        let chunks = parse_ndjson_buffered(&mut buffer);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_ref().unwrap(), "b");
    }

    #[test]
    fn test_parse_ndjson_skips_malformed_and_done() {
        let mut buffer = String::from(
            "not json\n{\"message\":{\"content\":\"ok\"}}\n{\"done\":true}\n",
        );
        let chunks = parse_ndjson_buffered(&mut buffer);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_ref().unwrap(), "ok");
    }

    #[test]
    fn test_recoverable_errors() {
        let unavailable = Error::Unavailable {
            host: DEFAULT_HOST.to_string(),
        };
        let timeout = Error::Timeout { seconds: 10 };
        let api = Error::Api {
            status: 500,
            message: String::new(),
        };

        assert!(unavailable.is_recoverable());
        assert!(timeout.is_recoverable());
        assert!(!api.is_recoverable());
    }
}
