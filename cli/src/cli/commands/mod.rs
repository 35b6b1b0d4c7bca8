//! Command implementations.

pub mod completions;
pub mod tokens;

pub use completions::handle_completions;
pub use tokens::{handle_new, handle_refresh, handle_revoke};

use crate::auth::{ProviderEndpoints, TokenFlowController};
use crate::client::build_http_client;
use crate::config::CheckinConfig;
use crate::error::Result;

/// Build a controller from configuration, letting flags override the configured client.
pub fn build_controller(
    config: &CheckinConfig,
    client_id: Option<String>,
    audience: Option<String>,
) -> Result<TokenFlowController> {
    let endpoints = ProviderEndpoints::from_settings(&config.provider)?;
    let http = build_http_client(&config.http)?;
    let client_id = client_id.unwrap_or_else(|| config.client.client_id.clone());

    Ok(TokenFlowController::new(http, endpoints, client_id)
        .with_audience(audience.or_else(|| config.client.audience.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_configured_client() {
        let config = CheckinConfig::default();

        let controller = build_controller(&config, Some("custom".to_string()), None).unwrap();
        assert_eq!(controller.client_id(), "custom");

        let controller = build_controller(&config, None, None).unwrap();
        assert_eq!(controller.client_id(), "oidc-agent");
    }
}
