//! Core `ChatModel` trait and `OpenAiChatModel` implementation.
//!
//! `OpenAiChatModel` calls any OpenAI-compatible `/v1/chat/completions`
//! endpoint: OpenAI, Ollama (OpenAI mode), Groq, LM Studio, vLLM, etc.
//! All connection details come from [`LlmConfig`]; nothing is hardcoded.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::LlmConfig;
use crate::conversation::Turn;

// ---------------------------------------------------------------------------
// ChatError
// ---------------------------------------------------------------------------

/// Errors that can occur while asking the model for a completion.
#[derive(Debug, Error)]
pub enum ChatError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("chat request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status.
    #[error("chat endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse chat response: {0}")]
    Parse(String),

    /// The model returned a response with no usable text content.
    #[error("model returned an empty response")]
    EmptyResponse,
}

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ChatError::Timeout
        } else {
            ChatError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ChatModel trait
// ---------------------------------------------------------------------------

/// A conversational model: given the ordered turns so far, produce the next
/// assistant message.
///
/// Implementors must be `Send + Sync` so they can be shared behind an
/// `Arc<dyn ChatModel>`.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, turns: &[Turn]) -> Result<String, ChatError>;
}

// ---------------------------------------------------------------------------
// OpenAiChatModel
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAiChatModel {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiChatModel {
    /// Build a client from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`.  A default client is used if the builder fails.
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    /// The `Authorization: Bearer …` header is attached only when
    /// `config.api_key` is a non-empty string.
    async fn complete(&self, turns: &[Turn]) -> Result<String, ChatError> {
        let body = serde_json::json!({
            "model":       self.config.model,
            "messages":    turns,
            "stream":      false,
            "temperature": self.config.temperature,
        });

        let mut req = self.client.post(self.endpoint()).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        log::debug!(
            "chat: sending {} turns to model {}",
            turns.len(),
            self.config.model
        );
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChatError::Parse(e.to_string()))?;

        extract_reply(&json)
    }
}

/// Pull `choices[0].message.content` out of a completion response.
fn extract_reply(json: &serde_json::Value) -> Result<String, ChatError> {
    let reply = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or(ChatError::EmptyResponse)?
        .trim()
        .to_string();

    if reply.is_empty() {
        return Err(ChatError::EmptyResponse);
    }
    Ok(reply)
}

// ---------------------------------------------------------------------------
// MockChatModel  (test-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
type Responder = Box<dyn Fn(&[Turn]) -> Result<String, ChatError> + Send + Sync>;

/// Test double that answers through a closure and records every request.
#[cfg(test)]
pub struct MockChatModel {
    respond: Responder,
    calls: std::sync::Mutex<Vec<Vec<Turn>>>,
}

#[cfg(test)]
impl MockChatModel {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&[Turn]) -> Result<String, ChatError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Always answers `reply`.
    pub fn replying(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Ok(reply.clone()))
    }

    /// Always fails with a connection error.
    pub fn failing() -> Self {
        Self::new(|_| Err(ChatError::Request("connection refused".into())))
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<Vec<Turn>> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, turns: &[Turn]) -> Result<String, ChatError> {
        self.calls.lock().unwrap().push(turns.to_vec());
        (self.respond)(turns)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
