//! Request and response payloads for the `/auth/*` endpoints.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::bundle::CredentialBundle;
use crate::error::ClientError;

/// Lifetime assumed when the server omits `expiresIn`.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Account role chosen at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Role {
    Candidate,
    Recruiter,
    Admin,
}

/// Registration form.
///
/// # Example
/// ```
/// use jobmatch_client::auth::{RegisterRequest, Role};
///
/// let request = RegisterRequest::builder()
///     .full_name("Ada Lovelace".to_string())
///     .email("ada@example.com".to_string())
///     .phone_number("0123456789".to_string())
///     .password("hunter22".to_string())
///     .role(Role::Candidate)
///     .build();
/// assert_eq!(request.role, Role::Candidate);
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub access_token: String,
    pub refresh_token: String,
}

/// Token payload returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Profile payload some deployments attach to the login response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
}

impl AuthResponse {
    /// Decode either a bare payload or one wrapped in the `{ data: ... }` envelope.
    pub fn from_body(body: serde_json::Value) -> Result<Self, ClientError> {
        let payload = match body {
            serde_json::Value::Object(mut map)
                if !map.contains_key("token") && map.contains_key("data") =>
            {
                map.remove("data").unwrap_or_default()
            }
            other => other,
        };
        if !payload.is_object() {
            return Err(ClientError::InvalidResponse(
                "auth response is not an object".to_string(),
            ));
        }
        Ok(serde_json::from_value(payload)?)
    }

    /// Build a complete bundle issued now, or fail without touching any store.
    pub fn to_bundle(&self) -> Result<CredentialBundle, ClientError> {
        self.to_bundle_keeping(None)
    }

    /// Like [`AuthResponse::to_bundle`], reusing `current_refresh` when the
    /// server did not rotate the refresh token.
    pub fn to_bundle_keeping(
        &self,
        current_refresh: Option<&str>,
    ) -> Result<CredentialBundle, ClientError> {
        let token = self
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ClientError::InvalidResponse("no access token received".to_string()))?;
        let refresh = self
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(current_refresh)
            .ok_or_else(|| {
                ClientError::InvalidResponse("no refresh token received".to_string())
            })?;
        let expires_in = self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        Ok(CredentialBundle::new(token, refresh, expires_in)?)
    }
}
