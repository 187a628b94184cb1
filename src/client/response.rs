//! Response decoding and error mapping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::transport::TransportResponse;
use crate::error::{status_message, ClientError};

/// Standard backend wrapper around response payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl<T> ApiResponse<T> {
    /// The payload, or an HTTP-style error when the server flagged `success: false`.
    pub fn into_data(self) -> Result<T, ClientError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ClientError::http(
                400,
                self.message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            ))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    errors: Option<HashMap<String, Vec<String>>>,
}

/// Parse a 2xx body. Empty bodies decode to `null`, non-JSON text to a string.
pub fn decode_body(response: &TransportResponse) -> Result<serde_json::Value, ClientError> {
    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Null);
    }
    let declared_json = response
        .content_type()
        .is_some_and(|ct| ct.contains("json"));
    match serde_json::from_slice(&response.body) {
        Ok(value) => Ok(value),
        Err(err) if declared_json => Err(ClientError::Serialization(err)),
        Err(_) => Ok(serde_json::Value::String(response.text())),
    }
}

/// Map a non-2xx response to [`ClientError::Http`], preferring the server's message.
pub fn error_from_response(response: &TransportResponse) -> ClientError {
    let status = response.status.as_u16();
    let text = response.text();
    let parsed: Option<ErrorBody> = serde_json::from_str(&text).ok();

    let (server_message, code, errors) = match parsed {
        Some(body) => (
            body.message
                .or(body.error)
                .filter(|m| !m.trim().is_empty()),
            body.code,
            body.errors,
        ),
        None => {
            let trimmed = text.trim();
            let looks_like_markup = trimmed.starts_with('<');
            let message = (!trimmed.is_empty() && !looks_like_markup).then(|| trimmed.to_string());
            (message, None, None)
        }
    };

    let message = server_message.unwrap_or_else(|| match status {
        403 => "Access denied. You don't have permission to access this resource".to_string(),
        _ => status_message(status),
    });

    ClientError::Http {
        status,
        message,
        code,
        errors,
    }
}
