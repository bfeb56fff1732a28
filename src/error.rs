use reqwest::StatusCode;
use thiserror::Error;
use tracing::error;

use crate::models::FieldErrors;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Rejected by server: {0}")]
    Rejected(String),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Not signed in")]
    NotAuthenticated,
}

impl ClientError {
    /// Builds the error for a non-success HTTP response. 409 is the only
    /// status the views treat specially.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        if status == StatusCode::CONFLICT {
            let message = conflict_message(&body);
            return ClientError::Conflict(message);
        }
        ClientError::Status { status, body }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ClientError::Conflict(_))
    }

    /// Message suitable for a generic error notice.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Conflict(msg) | ClientError::Rejected(msg) => msg.clone(),
            ClientError::Validation(errors) => errors.to_string(),
            ClientError::NotAuthenticated => "Please sign in first".to_string(),
            ClientError::Transport(e) => {
                error!("transport error: {}", e);
                "Could not reach the server".to_string()
            }
            other => other.to_string(),
        }
    }
}

fn conflict_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            if body.is_empty() {
                "Already exists".to_string()
            } else {
                body.to_string()
            }
        })
}
