//! Token command handlers.

use std::time::Duration;

use crate::auth::device_flow::initial_interval;
use crate::auth::{open_browser, TokenFlowController, TokenStore};
use crate::error::{CheckinError, Result};

/// Handle the `checkin-token new` command.
pub async fn handle_new(
    controller: &TokenFlowController,
    store: &dyn TokenStore,
    scope: &str,
    timeout: Duration,
    open: bool,
) -> Result<()> {
    println!(
        "[1/3] Requesting device code from EGI Check-in as client_id='{}' ...",
        controller.client_id()
    );
    let device_auth = controller.start_device_authorization(scope).await?;

    println!();
    println!("[2/3] Please authorize this application:");
    println!("  User code:            {}", device_auth.user_code);
    println!("  Verification URL:     {}", device_auth.verification_uri);
    println!("  Or open directly:     {}", device_auth.direct_uri());
    println!();

    if open {
        if open_browser(device_auth.direct_uri()) {
            println!("Browser opened automatically.");
        } else {
            println!("Could not open browser. Please visit the URL manually.");
        }
        println!();
    }

    println!(
        "[3/3] Polling token endpoint every {}s ... (Ctrl+C to abort)",
        initial_interval(device_auth.interval).as_secs()
    );
    let tokens = controller.poll_for_token(&device_auth, timeout).await?;

    println!();
    println!("Success! Received tokens:");
    println!("{}", tokens.summary());

    store.save(&tokens)?;
    println!();
    println!(
        "Tokens saved to: {} (permissions 0600)",
        store.location().display()
    );

    Ok(())
}

/// Handle the `checkin-token refresh` command.
///
/// With an explicit refresh token the provider response is stored as is.
/// Otherwise the stored set is refreshed and merged with the response, so
/// fields the provider does not resend survive.
pub async fn handle_refresh(
    controller: &TokenFlowController,
    store: &dyn TokenStore,
    refresh_token: Option<String>,
) -> Result<()> {
    let tokens = match refresh_token.filter(|t| !t.is_empty()) {
        Some(refresh_token) => controller.refresh(&refresh_token).await?,
        None => {
            let stored = store.load()?;
            let Some(refresh_token) = stored.usable_refresh_token() else {
                return Err(CheckinError::MissingRefreshToken(store.location()));
            };
            let refreshed = controller.refresh(refresh_token).await?;
            stored.merged_with(refreshed)
        },
    };

    match tokens.expires_in() {
        Some(secs) => println!("Refreshed. New access_token expires in {secs} seconds."),
        None => println!("Refreshed."),
    }

    store.save(&tokens)?;
    println!(
        "Tokens saved to: {} (permissions 0600)",
        store.location().display()
    );

    Ok(())
}

/// Handle the `checkin-token revoke` command.
pub async fn handle_revoke(
    controller: &TokenFlowController,
    refresh_token: Option<String>,
    access_token: Option<String>,
) -> Result<()> {
    let (Some(refresh_token), Some(access_token)) = (
        refresh_token.filter(|t| !t.is_empty()),
        access_token.filter(|t| !t.is_empty()),
    ) else {
        return Err(CheckinError::MissingRevokeArguments);
    };

    controller.revoke(&refresh_token, &access_token).await?;
    println!("Refresh token successfully revoked.");

    Ok(())
}
