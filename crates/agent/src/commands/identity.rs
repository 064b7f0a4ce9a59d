//! Login and logout commands

use std::time::Instant;

use codetrail_domain::{ProfileInfo, Result};
use tracing::{info, warn};

use crate::utils::logging::{error_label, log_command_execution};
use crate::AgentContext;

/// Log in with an `identity/token` user token.
///
/// On success the token is stored for the next session and the user's
/// tracking timings are pulled from the server.
///
/// # Errors
/// `Auth` for malformed or rejected tokens, `Network` when the server is
/// unreachable, `Io` when the token cannot be stored.
pub async fn login(ctx: &AgentContext, user_token: &str) -> Result<()> {
    let command_name = "identity::login";
    let start = Instant::now();

    info!(command = command_name, "Logging in");
    let result = match ctx.identity.login(user_token).await {
        Ok(()) => ctx.refresh_user_configuration().await.map(|_| ()),
        Err(err) => Err(err),
    };

    if let Err(err) = &result {
        warn!(command = command_name, error_type = error_label(err), error = %err, "Login failed");
    }
    log_command_execution(command_name, start.elapsed(), result.is_ok());
    result
}

/// Forget the stored token.
///
/// # Errors
/// `Io` when the settings file cannot be updated.
pub async fn logout(ctx: &AgentContext) -> Result<()> {
    let command_name = "identity::logout";
    let start = Instant::now();

    let result = ctx.identity.logout().await;
    log_command_execution(command_name, start.elapsed(), result.is_ok());
    result
}

/// The logged-in user's profile, when logged in and the server answers.
pub async fn profile(ctx: &AgentContext) -> Option<ProfileInfo> {
    let identity = ctx.identity.identity()?;
    let response = ctx.client.get_profile(&identity).await;
    if response.payload.is_none() {
        warn!(status = %response.status, reason = %response.reason, "Profile unavailable");
    }
    response.payload
}
