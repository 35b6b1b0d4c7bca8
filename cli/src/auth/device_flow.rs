//! OAuth device authorization polling (RFC 8628).
//!
//! The poll loop is an explicit state machine. It starts in
//! [`PollState::Pending`] and each token-endpoint answer moves it either back
//! to `Pending` (possibly with a longer interval) or to one of the terminal
//! states. Sleeping and time measurement go through [`Clock`] so the policy
//! can be exercised without waiting.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use oauth2::basic::BasicErrorResponseType;
use oauth2::devicecode::{DeviceCodeErrorResponse, DeviceCodeErrorResponseType};
use reqwest::StatusCode;

use crate::auth::tokens::TokenSet;
use crate::error::{CheckinError, Result};

/// Lower bound on the poll interval, whatever the provider suggests.
pub const MIN_INTERVAL: Duration = Duration::from_secs(5);

/// Interval growth applied on every `slow_down`.
pub const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

/// Upper bound on the poll interval after `slow_down` responses.
pub const MAX_INTERVAL: Duration = Duration::from_secs(30);

/// Local polling budget when the caller does not choose one.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(900);

/// Source of time for the poll loop.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current monotonic instant.
    fn now(&self) -> Instant;

    /// Suspend the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Interval to start polling with.
#[must_use]
pub fn initial_interval(server_suggested_secs: u64) -> Duration {
    Duration::from_secs(server_suggested_secs).max(MIN_INTERVAL)
}

/// Interval after a `slow_down` response.
#[must_use]
pub fn slowed_interval(current: Duration) -> Duration {
    current
        .saturating_add(SLOW_DOWN_STEP)
        .min(MAX_INTERVAL)
        .max(current)
}

/// Overall polling budget: the local cap or the device code lifetime, whichever is shorter.
#[must_use]
pub fn polling_budget(timeout: Duration, device_code_expires_in: Option<u64>) -> Duration {
    device_code_expires_in
        .map(Duration::from_secs)
        .map_or(timeout, |expiry| expiry.min(timeout))
}

/// State of a device-flow poll loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PollState {
    /// Waiting for the user; poll again after `interval`.
    Pending {
        /// Delay before the next poll.
        interval: Duration,
    },
    /// The provider issued tokens.
    Success(TokenSet),
    /// The user refused the request.
    Denied {
        /// OAuth error code.
        error: String,
        /// Raw response body.
        body: String,
    },
    /// The device code is no longer valid.
    Expired {
        /// OAuth error code.
        error: String,
        /// Raw response body.
        body: String,
    },
    /// The local polling budget ran out.
    TimedOut {
        /// Time spent polling.
        waited: Duration,
    },
    /// The provider answered with something unexpected.
    Fatal {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

impl PollState {
    /// Initial state for a server-suggested interval.
    #[must_use]
    pub fn start(server_suggested_secs: u64) -> Self {
        Self::Pending {
            interval: initial_interval(server_suggested_secs),
        }
    }

    /// Whether polling should continue.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Short name of the state, safe to log: carries no tokens or bodies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Pending { .. } => "pending",
            Self::Success(_) => "success",
            Self::Denied { .. } => "denied",
            Self::Expired { .. } => "expired",
            Self::TimedOut { .. } => "timed_out",
            Self::Fatal { .. } => "fatal",
        }
    }

    /// Apply one token-endpoint response.
    ///
    /// Terminal states are returned unchanged.
    #[must_use]
    pub fn advance(self, status: StatusCode, body: &str) -> Self {
        let Self::Pending { interval } = self else {
            return self;
        };

        if status == StatusCode::OK {
            return match serde_json::from_str::<TokenSet>(body) {
                Ok(tokens) => Self::Success(tokens),
                Err(_) => Self::fatal(status, body),
            };
        }

        let Ok(response) = serde_json::from_str::<DeviceCodeErrorResponse>(body) else {
            return Self::fatal(status, body);
        };

        match response.error() {
            DeviceCodeErrorResponseType::AuthorizationPending => Self::Pending { interval },
            DeviceCodeErrorResponseType::SlowDown => Self::Pending {
                interval: slowed_interval(interval),
            },
            DeviceCodeErrorResponseType::AccessDenied => Self::Denied {
                error: "access_denied".to_string(),
                body: body.to_string(),
            },
            DeviceCodeErrorResponseType::ExpiredToken => Self::Expired {
                error: "expired_token".to_string(),
                body: body.to_string(),
            },
            DeviceCodeErrorResponseType::Basic(BasicErrorResponseType::InvalidGrant) => {
                Self::Expired {
                    error: "invalid_grant".to_string(),
                    body: body.to_string(),
                }
            },
            DeviceCodeErrorResponseType::Basic(_) => Self::fatal(status, body),
        }
    }

    /// Convert a finished loop into its outcome.
    ///
    /// # Errors
    ///
    /// Every state other than [`PollState::Success`] maps to its error.
    pub fn into_result(self) -> Result<TokenSet> {
        match self {
            Self::Success(tokens) => Ok(tokens),
            Self::Denied { error, body } | Self::Expired { error, body } => {
                Err(CheckinError::DeviceFlowRejected { error, body })
            },
            Self::TimedOut { waited } => Err(CheckinError::PollingTimedOut {
                waited_secs: waited.as_secs(),
            }),
            Self::Fatal { status, body } => {
                Err(CheckinError::UnexpectedProviderResponse { status, body })
            },
            Self::Pending { .. } => Err(CheckinError::UnexpectedProviderResponse {
                status: 0,
                body: "polling stopped while authorization was still pending".to_string(),
            }),
        }
    }

    fn fatal(status: StatusCode, body: &str) -> Self {
        Self::Fatal {
            status: status.as_u16(),
            body: body.to_string(),
        }
    }
}

/// Open the verification URL in the default browser.
///
/// Returns `true` if the browser was opened successfully, `false` otherwise.
pub fn open_browser(url: &str) -> bool {
    open::that(url).is_ok()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Clock that advances instantly and records every sleep.
    pub struct FakeClock {
        origin: Instant,
        elapsed: Mutex<Duration>,
        sleeps: Mutex<Vec<Duration>>,
    }

    impl FakeClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                elapsed: Mutex::new(Duration::ZERO),
                sleeps: Mutex::new(Vec::new()),
            }
        }

        pub fn sleeps(&self) -> Vec<Duration> {
            self.sleeps.lock().unwrap().clone()
        }

        pub fn elapsed(&self) -> Duration {
            *self.elapsed.lock().unwrap()
        }
    }

    #[async_trait]
    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.origin + *self.elapsed.lock().unwrap()
        }

        async fn sleep(&self, duration: Duration) {
            *self.elapsed.lock().unwrap() += duration;
            self.sleeps.lock().unwrap().push(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PENDING: &str = r#"{"error":"authorization_pending"}"#;
    const SLOW_DOWN: &str = r#"{"error":"slow_down"}"#;

    fn pending(secs: u64) -> PollState {
        PollState::Pending {
            interval: Duration::from_secs(secs),
        }
    }

    #[test]
    fn initial_interval_never_below_five() {
        assert_eq!(initial_interval(0), Duration::from_secs(5));
        assert_eq!(initial_interval(1), Duration::from_secs(5));
        assert_eq!(initial_interval(5), Duration::from_secs(5));
        assert_eq!(initial_interval(12), Duration::from_secs(12));
    }

    #[test]
    fn authorization_pending_keeps_interval() {
        let state = pending(5).advance(StatusCode::BAD_REQUEST, PENDING);
        assert_eq!(state, pending(5));

        let state = pending(20).advance(StatusCode::BAD_REQUEST, PENDING);
        assert_eq!(state, pending(20));
    }

    #[test]
    fn slow_down_grows_by_five_up_to_thirty() {
        let mut state = pending(5);
        let mut seen = Vec::new();
        for _ in 0..8 {
            state = state.advance(StatusCode::BAD_REQUEST, SLOW_DOWN);
            let PollState::Pending { interval } = state else {
                panic!("slow_down must stay pending");
            };
            seen.push(interval.as_secs());
        }
        assert_eq!(seen, vec![10, 15, 20, 25, 30, 30, 30, 30]);
    }

    #[test]
    fn slow_down_never_shrinks_a_large_interval() {
        assert_eq!(slowed_interval(Duration::from_secs(28)), Duration::from_secs(30));
        assert_eq!(slowed_interval(Duration::from_secs(45)), Duration::from_secs(45));
    }

    #[test]
    fn slow_down_on_huge_interval_does_not_overflow() {
        assert_eq!(slowed_interval(Duration::MAX), Duration::MAX);

        let state = PollState::start(u64::MAX).advance(StatusCode::BAD_REQUEST, SLOW_DOWN);
        assert_eq!(
            state,
            PollState::Pending {
                interval: Duration::from_secs(u64::MAX)
            }
        );
    }

    #[test]
    fn ok_response_yields_tokens() {
        let state = pending(5).advance(
            StatusCode::OK,
            r#"{"access_token":"a1","refresh_token":"r1","expires_in":3600}"#,
        );
        let PollState::Success(tokens) = state else {
            panic!("expected success, got {state:?}");
        };
        assert_eq!(tokens.access_token(), "a1");
        assert_eq!(tokens.refresh_token(), Some("r1"));
    }

    #[test]
    fn ok_response_with_float_lifetime_and_nulls_yields_tokens() {
        let state = pending(5).advance(
            StatusCode::OK,
            r#"{"access_token":"a1","expires_in":3600.0,"id_token":null}"#,
        );
        let PollState::Success(tokens) = state else {
            panic!("expected success, got {state:?}");
        };
        assert_eq!(tokens.expires_in(), Some(3600));
        assert_eq!(tokens.get("id_token"), Some(&serde_json::Value::Null));
    }

    #[test]
    fn kind_names_state_without_body() {
        let denied = pending(5).advance(
            StatusCode::BAD_REQUEST,
            r#"{"error":"access_denied","error_description":"secret-detail"}"#,
        );
        assert_eq!(denied.kind(), "denied");
        assert!(!denied.kind().contains("secret-detail"));
        assert_eq!(pending(5).kind(), "pending");
    }

    #[test]
    fn ok_response_without_tokens_is_fatal() {
        let state = pending(5).advance(StatusCode::OK, r#"{"hello":"world"}"#);
        assert!(matches!(state, PollState::Fatal { status: 200, .. }));
    }

    #[test]
    fn terminal_codes_end_polling() {
        let denied = pending(5).advance(StatusCode::BAD_REQUEST, r#"{"error":"access_denied"}"#);
        assert!(matches!(denied, PollState::Denied { ref error, .. } if error == "access_denied"));

        let expired = pending(5).advance(StatusCode::BAD_REQUEST, r#"{"error":"expired_token"}"#);
        assert!(matches!(expired, PollState::Expired { ref error, .. } if error == "expired_token"));

        let invalid = pending(5).advance(StatusCode::BAD_REQUEST, r#"{"error":"invalid_grant"}"#);
        assert!(matches!(invalid, PollState::Expired { ref error, .. } if error == "invalid_grant"));

        for state in [denied, expired, invalid] {
            assert!(!state.is_pending());
            let err = state.into_result().unwrap_err();
            assert!(matches!(err, CheckinError::DeviceFlowRejected { .. }));
        }
    }

    #[test]
    fn unknown_error_code_is_fatal() {
        let state = pending(5).advance(StatusCode::BAD_REQUEST, r#"{"error":"invalid_client"}"#);
        assert!(matches!(state, PollState::Fatal { status: 400, .. }));

        let state = pending(5).advance(StatusCode::BAD_REQUEST, r#"{"error":"something_new"}"#);
        assert!(matches!(state, PollState::Fatal { status: 400, .. }));
    }

    #[test]
    fn unparseable_body_is_fatal() {
        let state = pending(5).advance(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>");
        let err = state.into_result().unwrap_err();
        assert!(matches!(
            err,
            CheckinError::UnexpectedProviderResponse { status: 502, ref body } if body.contains("Bad Gateway")
        ));
    }

    #[test]
    fn terminal_states_ignore_further_responses() {
        let done = PollState::TimedOut {
            waited: Duration::from_secs(900),
        };
        let after = done.clone().advance(StatusCode::OK, r#"{"access_token":"a"}"#);
        assert_eq!(after, done);
    }

    #[test]
    fn budget_takes_the_shorter_limit() {
        let local = Duration::from_secs(900);
        assert_eq!(polling_budget(local, None), local);
        assert_eq!(polling_budget(local, Some(600)), Duration::from_secs(600));
        assert_eq!(polling_budget(local, Some(1800)), local);
    }

    #[test]
    fn timed_out_state_reports_waited_seconds() {
        let err = PollState::TimedOut {
            waited: Duration::from_secs(905),
        }
        .into_result()
        .unwrap_err();
        assert!(matches!(err, CheckinError::PollingTimedOut { waited_secs: 905 }));
        assert!(err.requires_restart());
    }
}
