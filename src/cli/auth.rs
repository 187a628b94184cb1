//! CLI auth command handlers for login, register, status, and logout.

use crate::auth::{LoginRequest, RegisterRequest};
use crate::client::ApiClient;
use crate::monitor::TokenStatus;

use super::{print_json, LoginArgs, RegisterArgs};

/// Handle `jobmatch login`.
pub async fn handle_login(client: &ApiClient, args: LoginArgs) -> Result<(), Box<dyn std::error::Error>> {
    let response = client
        .login(&LoginRequest::new(args.email, args.password))
        .await?;
    println!("✅ Logged in");
    if let Some(user) = &response.user {
        print_json(user);
    }
    Ok(())
}

/// Handle `jobmatch register`.
pub async fn handle_register(
    client: &ApiClient,
    args: RegisterArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let request = RegisterRequest::builder()
        .full_name(args.full_name)
        .email(args.email)
        .phone_number(args.phone_number)
        .password(args.password)
        .role(args.role)
        .build();
    let response = client.register(&request).await?;
    print_json(&response);
    Ok(())
}

/// Handle `jobmatch status`.
pub async fn handle_status(client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    let status = TokenStatus::from_store(client.store());

    println!("🔐 Authentication Status\n");
    println!("  API: {}", client.config().base_url);
    if !status.has_token {
        println!("  Session: ❌ Not logged in");
    } else if status.expired {
        println!("  Session: ⚠️  Token expired (will refresh on next request)");
    } else if status.near_expiry {
        println!("  Session: ⚠️  Expires in {} (refresh pending)", status.remaining);
    } else {
        println!("  Session: ✅ Logged in (expires in {})", status.remaining);
    }
    Ok(())
}

/// Handle `jobmatch logout`.
pub async fn handle_logout(client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    client.logout().await;
    println!("✅ Logged out");
    Ok(())
}
