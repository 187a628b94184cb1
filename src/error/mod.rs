//! Error types for the JobMatch client.

pub mod unified;

pub use unified::{ErrorCategory, RecoverySuggestion};

use std::collections::HashMap;

use reqwest::StatusCode;
use thiserror::Error;

/// Primary error type for all client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Refresh failed, or a retried request was still unauthorized.
    ///
    /// The token store has already been cleared and the session-expired
    /// signal has fired by the time this reaches the caller.
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("HTTP error (status {status}): {message}")]
    Http {
        status: u16,
        message: String,
        code: Option<String>,
        errors: Option<HashMap<String, Vec<String>>>,
    },

    /// The transport failed before a response was received.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Create an HTTP error with only a status and message.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            code: None,
            errors: None,
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Authentication(_) => Some(401),
            _ => None,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::Network(_) => ErrorCategory::Network,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) | Self::InvalidResponse(_) => ErrorCategory::Serialization,
            Self::Http { status, .. } => match status {
                401 | 403 => ErrorCategory::Authorization,
                404 => ErrorCategory::NotFound,
                409 => ErrorCategory::Conflict,
                429 => ErrorCategory::RateLimit,
                400..=499 => ErrorCategory::Client,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Unknown,
            },
            Self::Io(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether a caller-side backoff policy could reasonably retry this.
    ///
    /// The client itself never retries these.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit | ErrorCategory::Network | ErrorCategory::Server
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Authentication => RecoverySuggestion::Login,
            ErrorCategory::Authorization => RecoverySuggestion::CheckPermissions,
            ErrorCategory::RateLimit
            | ErrorCategory::Network
            | ErrorCategory::Server => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Client | ErrorCategory::Conflict | ErrorCategory::NotFound => {
                RecoverySuggestion::FixRequest
            }
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::Cancelled => RecoverySuggestion::None,
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

/// Generic `HTTP <code>: <reason>` description used when the server sent no message.
pub fn status_message(status: u16) -> String {
    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown Status");
    format!("HTTP {status}: {reason}")
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ClientError>;
