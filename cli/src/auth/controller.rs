//! Token lifecycle against the identity provider.
//!
//! [`TokenFlowController`] issues the device authorization request, drives the
//! poll loop, and performs refresh and revocation. It never touches the
//! token file; persisting results is the caller's job.

use std::sync::Arc;
use std::time::Duration;

use oauth2::ClientId;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, info};

use crate::auth::device_flow::{polling_budget, Clock, PollState, SystemClock};
use crate::auth::providers::ProviderEndpoints;
use crate::auth::tokens::{DeviceAuthorizationResponse, TokenSet};
use crate::error::{CheckinError, Result};

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
const REFRESH_TOKEN_GRANT: &str = "refresh_token";

/// Drives device authorization, refresh and revocation for one client.
pub struct TokenFlowController {
    http: ClientWithMiddleware,
    endpoints: ProviderEndpoints,
    client_id: ClientId,
    audience: Option<String>,
    clock: Arc<dyn Clock>,
}

impl TokenFlowController {
    /// Create a controller for `client_id` against `endpoints`.
    #[must_use]
    pub fn new(
        http: ClientWithMiddleware,
        endpoints: ProviderEndpoints,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoints,
            client_id: ClientId::new(client_id.into()),
            audience: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Scope issued tokens to `audience`.
    #[must_use]
    pub fn with_audience(mut self, audience: Option<String>) -> Self {
        self.audience = audience.filter(|a| !a.is_empty());
        self
    }

    /// Replace the clock used for poll timing.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Client identifier sent with every request.
    #[must_use]
    pub fn client_id(&self) -> &str {
        self.client_id.as_str()
    }

    /// Start the device authorization flow.
    ///
    /// # Errors
    ///
    /// Returns [`CheckinError::AuthorizationInit`] if the provider rejects the
    /// request, or [`CheckinError::UnexpectedProviderResponse`] if its answer
    /// cannot be parsed.
    pub async fn start_device_authorization(
        &self,
        scope: &str,
    ) -> Result<DeviceAuthorizationResponse> {
        let mut form = vec![("client_id", self.client_id()), ("scope", scope)];
        self.push_audience(&mut form);

        debug!(client_id = self.client_id(), scope, "Requesting device code");
        let (status, body) = self
            .post_form(self.endpoints.device_authorization.url().as_str(), &form, None)
            .await?;

        if !status.is_success() {
            return Err(CheckinError::AuthorizationInit {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|_| CheckinError::UnexpectedProviderResponse {
            status: status.as_u16(),
            body,
        })
    }

    /// Poll the token endpoint until the user completes authorization.
    ///
    /// The loop gives up once `timeout` or the device code lifetime, whichever
    /// is shorter, has elapsed.
    ///
    /// # Errors
    ///
    /// Returns [`CheckinError::DeviceFlowRejected`] if the user denies access
    /// or the code expires, [`CheckinError::PollingTimedOut`] when the budget
    /// runs out, and [`CheckinError::UnexpectedProviderResponse`] for anything
    /// else the provider sends.
    pub async fn poll_for_token(
        &self,
        device: &DeviceAuthorizationResponse,
        timeout: Duration,
    ) -> Result<TokenSet> {
        let budget = polling_budget(timeout, device.expires_in);
        let started = self.clock.now();
        // A budget too large to represent as an instant means no deadline.
        let deadline = started.checked_add(budget);

        let mut form = vec![
            ("grant_type", DEVICE_CODE_GRANT),
            ("device_code", device.device_code.as_str()),
            ("client_id", self.client_id()),
        ];
        self.push_audience(&mut form);

        let mut state = PollState::start(device.interval);
        while state.is_pending() {
            let now = self.clock.now();
            if deadline.is_some_and(|deadline| now > deadline) {
                state = PollState::TimedOut {
                    waited: now - started,
                };
                break;
            }

            let (status, body) = self
                .post_form(self.endpoints.token.url().as_str(), &form, None)
                .await?;
            state = state.advance(status, &body);

            if let PollState::Pending { interval } = state {
                debug!(
                    status = status.as_u16(),
                    interval_secs = interval.as_secs(),
                    "Authorization pending"
                );
                self.clock.sleep(interval).await;
            }
        }

        match &state {
            PollState::Success(_) => info!("Device authorization completed"),
            PollState::Fatal { status, .. } => {
                info!(status, "Device authorization ended with an unexpected response");
            },
            other => info!(
                state = other.kind(),
                "Device authorization ended without tokens"
            ),
        }
        state.into_result()
    }

    /// Obtain a new token set with a refresh token.
    ///
    /// Returns exactly what the provider sends; merging with a stored set is
    /// left to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`CheckinError::RefreshFailed`] for any non-200 response.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet> {
        let mut form = vec![
            ("grant_type", REFRESH_TOKEN_GRANT),
            ("client_id", self.client_id()),
            ("refresh_token", refresh_token),
        ];
        self.push_audience(&mut form);

        debug!(client_id = self.client_id(), "Refreshing tokens");
        let (status, body) = self
            .post_form(self.endpoints.token.url().as_str(), &form, None)
            .await?;

        if status != StatusCode::OK {
            return Err(CheckinError::RefreshFailed {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|_| CheckinError::UnexpectedProviderResponse {
            status: status.as_u16(),
            body,
        })
    }

    /// Revoke a refresh token, authenticating with a valid access token.
    ///
    /// # Errors
    ///
    /// Returns [`CheckinError::RevokeFailed`] for any non-200 response.
    pub async fn revoke(&self, refresh_token: &str, access_token: &str) -> Result<()> {
        let form = [
            ("token", refresh_token),
            ("token_type_hint", "refresh_token"),
            ("client_id", self.client_id()),
        ];

        debug!(client_id = self.client_id(), "Revoking refresh token");
        let (status, body) = self
            .post_form(
                self.endpoints.revocation.url().as_str(),
                &form,
                Some(access_token),
            )
            .await?;

        if status == StatusCode::OK {
            Ok(())
        } else {
            Err(CheckinError::RevokeFailed {
                status: status.as_u16(),
                body,
            })
        }
    }

    fn push_audience<'a>(&'a self, form: &mut Vec<(&'static str, &'a str)>) {
        if let Some(audience) = self.audience.as_deref() {
            form.push(("audience", audience));
        }
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<(StatusCode, String)> {
        let mut request = self.http.post(url).form(form);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}
