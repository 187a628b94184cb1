use thiserror::Error;

use crate::error::ClientError;

/// Errors raised by credential storage and bundle validation.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credential bundle: {0}")]
    InvalidBundle(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<AuthError> for ClientError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidBundle(msg) => ClientError::InvalidResponse(msg),
            other => ClientError::Configuration(other.to_string()),
        }
    }
}
