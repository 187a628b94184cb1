//! JobMatch API client
//!
//! Authenticated HTTP access to the JobMatch backend. Requests carry the
//! stored bearer token; an expired or rejected token is refreshed once,
//! shared by every concurrent caller, and the original request is replayed.
//! When the session cannot be recovered, registered listeners are notified.
//!
//! # Quick Start
//!
//! ```no_run
//! use jobmatch_client::prelude::*;
//!
//! # async fn example() -> jobmatch_client::error::Result<()> {
//! let client = ApiClient::new(ClientConfig::from_env()?)?;
//! client.login(&LoginRequest::new("ada@example.com", "hunter22")).await?;
//!
//! let jobs = client.jobs(&JobSearch::default()).await?;
//! println!("{} jobs", jobs.data.total_elements);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod monitor;
pub mod prelude;
pub mod resources;

#[cfg(feature = "cli")]
pub mod cli;
