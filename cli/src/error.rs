//! Error types and result aliases for checkin-token.
//!
//! Every failure the tool can hit maps to one [`CheckinError`] variant, so
//! callers branch on the kind of failure instead of matching message text.
//! Variants carrying a provider response keep both the HTTP status and the
//! raw body so the user sees exactly what the identity provider said.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for checkin-token operations.
#[derive(Error, Debug)]
pub enum CheckinError {
    /// The device authorization request was rejected by the provider.
    #[error("Device authorization request failed ({status}): {body}")]
    AuthorizationInit {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The provider ended the device flow with a terminal error code.
    #[error("Device flow failed: {error}: {body}")]
    DeviceFlowRejected {
        /// OAuth error code (`access_denied`, `expired_token`, `invalid_grant`).
        error: String,
        /// Raw response body.
        body: String,
    },

    /// The local polling budget ran out before the user approved the request.
    #[error("Device code polling timed out after {waited_secs}s.")]
    PollingTimedOut {
        /// Seconds spent polling before giving up.
        waited_secs: u64,
    },

    /// The provider answered with something the poll loop does not understand.
    #[error("Unexpected token response ({status}): {body}")]
    UnexpectedProviderResponse {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The refresh grant was rejected.
    #[error("Refresh failed ({status}): {body}")]
    RefreshFailed {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The revocation request was rejected.
    #[error("Failed to revoke token ({status}): {body}")]
    RevokeFailed {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// No token file exists at the given path.
    #[error("Token file not found: {}. Run 'checkin-token new' first.", .0.display())]
    TokenFileMissing(PathBuf),

    /// The token file exists but does not hold a token set.
    #[error("Token file {} is corrupt: {reason}", .path.display())]
    TokenFileCorrupt {
        /// Path of the offending file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// The token file could not be read or written.
    #[error("Cannot access token file {}: {source}", .path.display())]
    TokenFileError {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// The stored token set has no refresh token to refresh with.
    #[error("No refresh_token found in {}.", .0.display())]
    MissingRefreshToken(PathBuf),

    /// `revoke` was called without both tokens.
    #[error("Both --token and --access-token are required for revoke action.")]
    MissingRevokeArguments,

    /// The identity provider is unreachable.
    #[error("Identity provider is unavailable. Check your network connection or try again later.")]
    ProviderUnavailable,

    /// Request timed out.
    #[error("Request timed out. The identity provider may be slow or unreachable.")]
    Timeout,

    /// Network error during HTTP request.
    #[error("Network error: {0}. Check your internet connection.")]
    Network(String),

    /// General configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}. Check file permissions and format.")]
    ConfigRead(String),

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("Data serialization error: {0}")]
    Serialization(String),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl CheckinError {
    /// Checks if the device flow has to be started over from the beginning.
    ///
    /// Device codes are single-use and time-boxed, so a rejected or timed-out
    /// flow cannot be resumed.
    #[must_use]
    pub const fn requires_restart(&self) -> bool {
        matches!(
            self,
            Self::DeviceFlowRejected { .. } | Self::PollingTimedOut { .. }
        )
    }

    /// Process exit status for this error.
    ///
    /// Usage errors exit with 2, every operational failure with 1.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingRefreshToken(_) | Self::MissingRevokeArguments => 2,
            _ => 1,
        }
    }
}

/// Result type alias using [`CheckinError`].
pub type Result<T> = std::result::Result<T, CheckinError>;

impl From<serde_json::Error> for CheckinError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(format!("JSON error: {err}"))
    }
}

impl From<toml::de::Error> for CheckinError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigRead(format!("TOML parse error: {err}"))
    }
}

impl From<reqwest::Error> for CheckinError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::ProviderUnavailable
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<reqwest_middleware::Error> for CheckinError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(inner) => inner.into(),
            reqwest_middleware::Error::Middleware(inner) => Self::Network(inner.to_string()),
        }
    }
}
