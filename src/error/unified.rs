//! Error classification and recovery hints for the UI layer.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Session is gone; the user must log in again.
    Authentication,
    /// Logged in, but the server refused the action (401/403 surfaced as HTTP errors).
    Authorization,
    NotFound,
    Conflict,
    RateLimit,
    Client,
    Server,
    Network,
    Cancelled,
    Configuration,
    Serialization,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    Login,
    CheckPermissions,
    RetryWithBackoff,
    FixRequest,
    CheckConfiguration,
    ContactSupport,
    None,
}
