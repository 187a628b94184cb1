//! Credential bundle, token storage, refresh coordination and session events.

pub mod api;
pub mod bundle;
pub mod error;
pub mod refresh;
pub mod session;
pub mod store;

pub use api::{
    AuthResponse, LoginRequest, LogoutRequest, RefreshTokenRequest, RegisterRequest, Role,
};
pub use bundle::{format_remaining, CredentialBundle};
pub use error::AuthError;
pub use refresh::{RefreshCoordinator, RefreshFailure, RefreshOutcome};
pub use session::{ListenerId, SessionEvents, SessionExpired};
pub use store::{CredentialStorage, FileStorage, MemoryStorage, TokenStore};
