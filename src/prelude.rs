//! Convenience re-exports for common use.

pub use crate::auth::{
    CredentialBundle, LoginRequest, RegisterRequest, Role, SessionExpired, TokenStore,
};
pub use crate::client::{ApiClient, ApiRequest, ApiResponse, FilePart, QueryParams, UploadForm};
pub use crate::config::ClientConfig;
pub use crate::error::{ClientError, Result};
pub use crate::monitor::{TokenMonitor, TokenStatus};
pub use crate::resources::{JobSearch, Page, Pageable};
