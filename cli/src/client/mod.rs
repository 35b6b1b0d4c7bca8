//! HTTP client for talking to the identity provider.

pub mod middleware;

use std::time::Duration;

use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};

use crate::config::HttpSettings;
use crate::error::Result;

/// Build the HTTP client used for every provider request.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn build_http_client(settings: &HttpSettings) -> Result<ClientWithMiddleware> {
    let user_agent = settings
        .user_agent
        .clone()
        .unwrap_or_else(|| format!("checkin-token/{}", env!("CARGO_PKG_VERSION")));

    let inner = Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()?;

    Ok(ClientBuilder::new(inner)
        .with(middleware::RequestLogMiddleware)
        .build())
}
