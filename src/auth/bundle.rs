use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// Lifetimes above this are rejected; no server issues decade-long access tokens.
const MAX_EXPIRES_IN_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Access token, refresh token and expiry metadata, stored as one unit.
///
/// A bundle can only be built through [`CredentialBundle::new`] or
/// [`CredentialBundle::issued_at`], both of which reject empty tokens, so a
/// value of this type is never partial. Deserialization runs the same checks.
///
/// # Example
/// ```
/// use jobmatch_client::auth::CredentialBundle;
///
/// let bundle = CredentialBundle::new("A1", "R1", 3600)?;
/// assert_eq!(bundle.access_token(), "A1");
/// assert!(!bundle.is_expired());
/// # Ok::<(), jobmatch_client::auth::AuthError>(())
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBundle")]
pub struct CredentialBundle {
    access_token: String,
    refresh_token: String,
    issued_at: DateTime<Utc>,
    expires_in: u64,
}

impl CredentialBundle {
    /// Bundle issued now.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in_secs: u64,
    ) -> Result<Self, AuthError> {
        Self::issued_at(access_token, refresh_token, expires_in_secs, Utc::now())
    }

    /// Bundle issued at an explicit instant.
    pub fn issued_at(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in_secs: u64,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, AuthError> {
        let access_token = access_token.into();
        let refresh_token = refresh_token.into();
        if access_token.trim().is_empty() {
            return Err(AuthError::InvalidBundle("access token is empty".to_string()));
        }
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidBundle("refresh token is empty".to_string()));
        }
        if expires_in_secs > MAX_EXPIRES_IN_SECS {
            return Err(AuthError::InvalidBundle(format!(
                "expires_in of {expires_in_secs}s is out of range"
            )));
        }
        if issued_at.checked_add_signed(lifetime(expires_in_secs)).is_none() {
            return Err(AuthError::InvalidBundle(format!(
                "expiry of a bundle issued at {issued_at} is not representable"
            )));
        }
        Ok(Self {
            access_token,
            refresh_token,
            issued_at,
            expires_in: expires_in_secs,
        })
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn issued_at_time(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_in_secs(&self) -> u64 {
        self.expires_in
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        // Representability is checked at construction.
        self.issued_at
            .checked_add_signed(lifetime(self.expires_in))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    /// True once `now` is within `skew` of the expiry instant (or past it).
    pub fn is_near_expiry_at(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        let skew = chrono::Duration::from_std(skew).unwrap_or(chrono::Duration::MAX);
        match self.expires_at().checked_sub_signed(skew) {
            Some(threshold) => now >= threshold,
            None => true,
        }
    }

    /// Remaining lifetime, zero once expired.
    pub fn time_until_expiry_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at() - now).to_std().unwrap_or(Duration::ZERO)
    }
}

fn lifetime(expires_in_secs: u64) -> chrono::Duration {
    chrono::Duration::seconds(expires_in_secs.min(MAX_EXPIRES_IN_SECS) as i64)
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("access_token", &"..")
            .field("refresh_token", &"..")
            .field("issued_at", &self.issued_at)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Deserialize)]
struct RawBundle {
    access_token: String,
    refresh_token: String,
    issued_at: DateTime<Utc>,
    expires_in: u64,
}

impl TryFrom<RawBundle> for CredentialBundle {
    type Error = AuthError;

    fn try_from(raw: RawBundle) -> Result<Self, Self::Error> {
        CredentialBundle::issued_at(
            raw.access_token,
            raw.refresh_token,
            raw.expires_in,
            raw.issued_at,
        )
    }
}

/// Human-readable remaining lifetime, e.g. `"3 days"` or `"less than a minute"`.
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    if secs == 0 {
        return "expired".to_string();
    }
    let minutes = secs / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };
    if days > 0 {
        plural(days, "day")
    } else if hours > 0 {
        plural(hours, "hour")
    } else if minutes > 0 {
        plural(minutes, "minute")
    } else {
        "less than a minute".to_string()
    }
}
