//! Provider-agnostic request/response types and call errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prompt sent by connection probes.
pub const PROBE_PROMPT: &str = "Hello, this is a connection test.";

/// Output cap for connection probes.
pub const PROBE_MAX_TOKENS: u32 = 50;

/// Longest upstream error body kept in an error message.
pub const ERROR_BODY_LIMIT: usize = 500;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiMessage {
    pub role: MessageRole,
    pub content: String,
}

/// A request routed to an upstream provider.
///
/// `max_tokens` overrides the provider's configured output cap when set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<AiMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl AiRequest {
    /// Single-turn request carrying one user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            system: None,
            messages: vec![AiMessage {
                role: MessageRole::User,
                content: text.into(),
            }],
            max_tokens: None,
        }
    }

    /// Minimal side-effect-free request used for connection probes.
    pub fn probe() -> Self {
        Self {
            max_tokens: Some(PROBE_MAX_TOKENS),
            ..Self::user(PROBE_PROMPT)
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Text of the most recent user message, or empty.
    pub fn last_user_text(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Text returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiCompletion {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Failure of a single upstream call.
///
/// These are recorded as health results and never shown to end users.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("timeout after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("no credential configured (set {env_var} or store one)")]
    MissingCredential { env_var: String },

    #[error("empty response from provider")]
    EmptyResponse,
}

impl LlmError {
    /// Build an HTTP error, truncating the body to [`ERROR_BODY_LIMIT`] characters.
    pub fn http(status: u16, body: &str) -> Self {
        let body = if body.chars().count() > ERROR_BODY_LIMIT {
            body.chars().take(ERROR_BODY_LIMIT).collect()
        } else {
            body.to_string()
        };
        LlmError::Http { status, body }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, LlmError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_request_shape() {
        let req = AiRequest::probe();
        assert_eq!(req.max_tokens, Some(PROBE_MAX_TOKENS));
        assert_eq!(req.last_user_text(), PROBE_PROMPT);
        assert!(req.system.is_none());
    }

    #[test]
    fn test_last_user_text_skips_assistant_turns() {
        let mut req = AiRequest::user("first question");
        req.messages.push(AiMessage {
            role: MessageRole::Assistant,
            content: "an answer".to_string(),
        });
        assert_eq!(req.last_user_text(), "first question");
    }

    #[test]
    fn test_last_user_text_empty_request() {
        let req = AiRequest {
            system: None,
            messages: Vec::new(),
            max_tokens: None,
        };
        assert_eq!(req.last_user_text(), "");
    }

    #[test]
    fn test_timeout_message_identifies_timeout() {
        let err = LlmError::Timeout { seconds: 3 };
        assert!(err.to_string().starts_with("timeout after 3s"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_http_error_truncates_body() {
        let body = "x".repeat(2000);
        let err = LlmError::http(503, &body);
        let msg = err.to_string();
        assert!(msg.starts_with("HTTP 503: "));
        assert_eq!(msg.len(), "HTTP 503: ".len() + ERROR_BODY_LIMIT);
    }

    #[test]
    fn test_request_deserializes_without_optional_fields() {
        let req: AiRequest =
            serde_json::from_str(r#"{"messages":[{"role":"user","content":"hi"}]}"#).unwrap();
        assert_eq!(req.last_user_text(), "hi");
        assert!(req.max_tokens.is_none());
    }
}
