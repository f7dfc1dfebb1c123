//! Sign-in and session command handlers

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::services::auth::{extract_auth_code, token_claims};
use crate::services::ServiceFactory;
use crate::utils::errors::{GearError, Result};
use crate::utils::helpers::format_timestamp;

/// Handle `login` - print the provider sign-in URL
pub async fn handle_login(services: &ServiceFactory) -> Result<()> {
    let url = services.auth_service.begin_sign_in().await?;
    println!("Open this URL to sign in:\n\n  {}\n", url);
    println!("Then run `studio-gear callback <code-or-redirect-url>`.");
    Ok(())
}

/// Handle `callback` - exchange the authorization code for a session
pub async fn handle_callback(services: &ServiceFactory, input: &str) -> Result<()> {
    let code = extract_auth_code(input)
        .ok_or_else(|| GearError::InvalidInput("No authorization code found in the input.".to_string()))?;
    debug!("Completing sign-in");

    let session = services.auth_service.complete_sign_in(&code).await?;
    info!(user_id = %session.user.id, "Signed in");
    println!(
        "Signed in as {}.",
        session.user.email.as_deref().unwrap_or("(no email)")
    );
    Ok(())
}

pub async fn handle_logout(services: &ServiceFactory) -> Result<()> {
    services.auth_service.sign_out().await?;
    println!("Signed out.");
    Ok(())
}

/// Handle `whoami` - show the user, session expiry and active studio
pub async fn handle_whoami(services: &ServiceFactory) -> Result<()> {
    let session = services.auth_service.require_session().await?;
    println!("User:   {}", session.user.email.as_deref().unwrap_or("(no email)"));
    println!("Id:     {}", session.user.id);

    if let Ok(claims) = token_claims(&session.access_token) {
        if let Some(expires) = DateTime::<Utc>::from_timestamp(claims.exp, 0) {
            println!("Token:  valid until {}", format_timestamp(expires));
        }
    }

    match services.session_service.current_context().await {
        Ok(context) => println!("Studio: {} ({})", context.studio_id, context.role),
        Err(e) => println!("Studio: none - {}", e.user_message()),
    }
    Ok(())
}
