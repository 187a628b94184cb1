//! CLI entry point for the JobMatch client.

pub mod auth;
pub mod request;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::auth::Role;
use crate::client::ApiClient;
use crate::config::ClientConfig;

/// JobMatch API CLI
#[derive(Parser, Debug)]
#[command(name = "jobmatch", version, about = "JobMatch API command-line client")]
pub struct Cli {
    /// API base URL (overrides JOBMATCH_API_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Credential file (overrides JOBMATCH_TOKEN_FILE)
    #[arg(long, global = true)]
    pub token_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store credentials
    Login(LoginArgs),
    /// Create an account
    Register(RegisterArgs),
    /// Log out and clear stored credentials
    Logout,
    /// Show stored credential status
    Status,
    /// GET a resource
    Get(PathArgs),
    /// DELETE a resource
    Delete(PathArgs),
    /// POST a JSON body
    Post(BodyArgs),
    /// PUT a JSON body
    Put(BodyArgs),
    /// Upload a file as multipart form data
    Upload(UploadArgs),
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "JOBMATCH_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub full_name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub phone_number: String,

    #[arg(long, env = "JOBMATCH_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// CANDIDATE or RECRUITER
    #[arg(long, default_value = "CANDIDATE")]
    pub role: Role,
}

#[derive(Args, Debug)]
pub struct PathArgs {
    /// Path relative to the API base URL, e.g. /me/profile
    pub path: String,
}

#[derive(Args, Debug)]
pub struct BodyArgs {
    pub path: String,

    /// JSON request body
    #[arg(long, short)]
    pub data: Option<String>,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    pub path: String,

    pub file: PathBuf,

    /// Multipart field name for the file
    #[arg(long, default_value = "file")]
    pub field: String,

    /// Extra text fields as key=value
    #[arg(long = "extra", value_parser = parse_key_value)]
    pub extra: Vec<(String, String)>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

impl Cli {
    /// Resolve configuration from the environment, then apply flags.
    pub fn config(&self) -> crate::error::Result<ClientConfig> {
        let mut config = ClientConfig::from_env()?;
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(path) = &self.token_file {
            config = config.with_token_path(path.clone());
        }
        Ok(config)
    }

    pub fn client(&self) -> crate::error::Result<ApiClient> {
        ApiClient::new(self.config()?)
    }
}

/// Print a JSON value, pretty when possible.
pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}
