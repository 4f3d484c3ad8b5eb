//! Request error taxonomy
//!
//! Every failure surfaced by the HTTP layer is a [`RequestError`]. It is
//! `Clone` because the same value is kept in a controller's state and handed
//! back to the caller.

use serde_json::Value;
use thiserror::Error;

/// Server messages that mean the session token is no longer accepted
pub const AUTH_FAILURE_MESSAGES: [&str; 2] = ["Invalid token", "Authentication required"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Non-2xx response from the backend
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be read into the expected shape
    #[error("Failed to decode response body: {0}")]
    Decode(String),

    /// The request body could not be serialized
    #[error("Failed to encode request body: {0}")]
    Encode(String),
}

impl RequestError {
    /// Build a status error from a raw response body
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            message: server_message(status, body),
        }
    }

    /// HTTP status, when the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided message, or the local failure description
    pub fn message(&self) -> &str {
        match self {
            Self::Status { message, .. } => message,
            Self::Network(message) | Self::Decode(message) | Self::Encode(message) => message,
        }
    }

    /// Whether this failure should end the current session
    pub fn is_auth_failure(&self) -> bool {
        AUTH_FAILURE_MESSAGES.contains(&self.message())
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Pick the human readable message out of an error body.
///
/// Backends answer with `{"message": "..."}` (sometimes a list of validation
/// messages) or `{"error": "..."}`; anything else falls back to the raw text
/// and finally to the canonical reason phrase.
fn server_message(status: u16, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let field = json.get("message").or_else(|| json.get("error"));
        match field {
            Some(Value::String(message)) => return message.clone(),
            Some(Value::Array(items)) => {
                if let Some(Value::String(first)) = items.first() {
                    return first.clone();
                }
            }
            _ => {}
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown error")
        .to_string()
}
