//! Client error types.

use autoshorts_models::FormError;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("API returned {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Api { status: u16, detail: Option<String> },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Input(String),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Build an API error from a non-success response body.
    ///
    /// The backend reports failures as `{"detail": ...}` where `detail` is
    /// either a message or a list of validation entries carrying `msg`.
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::Api {
            status,
            detail: extract_detail(body),
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) => true,
            ClientError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// True if the backend rejected the credential.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
            || matches!(self, ClientError::Api { status: 401 | 403, .. })
    }

    /// Message to show the user.
    ///
    /// Server-provided detail is used verbatim; otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Api {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ClientError::Unauthorized(msg) | ClientError::Input(msg) => msg.clone(),
            ClientError::Form(err) => err.to_string(),
            _ => fallback.to_string(),
        }
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}
