//! Application configuration settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::auth::providers::egi;
use crate::auth::DEFAULT_POLL_TIMEOUT;

/// Token file used when neither config nor flags name one.
pub const DEFAULT_TOKENS_FILE: &str = "tokens_egi.json";

/// Main configuration for checkin-token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckinConfig {
    /// Identity provider endpoints.
    pub provider: ProviderSettings,
    /// OAuth client settings.
    pub client: ClientSettings,
    /// Token file settings.
    pub storage: StorageSettings,
    /// HTTP client settings.
    pub http: HttpSettings,
    /// Device flow polling settings.
    pub polling: PollingSettings,
}

/// Identity provider endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Keycloak realm base; the three endpoints are derived from it.
    pub realm_base: String,
    /// Explicit device authorization endpoint.
    pub device_authorization_url: Option<String>,
    /// Explicit token endpoint.
    pub token_url: Option<String>,
    /// Explicit revocation endpoint.
    pub revocation_url: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            realm_base: egi::REALM_BASE.to_string(),
            device_authorization_url: None,
            token_url: None,
            revocation_url: None,
        }
    }
}

/// OAuth client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// OAuth client ID.
    pub client_id: String,
    /// Space-separated scopes for new token sets.
    pub scope: String,
    /// Optional audience for issued tokens.
    pub audience: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            client_id: egi::DEFAULT_CLIENT_ID.to_string(),
            scope: egi::DEFAULT_SCOPE.to_string(),
            audience: None,
        }
    }
}

/// Token file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Where token sets are written.
    pub tokens_file: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            tokens_file: PathBuf::from(DEFAULT_TOKENS_FILE),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Custom User-Agent header.
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

/// Device flow polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    /// Overall polling budget in seconds.
    pub timeout_secs: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_POLL_TIMEOUT.as_secs(),
        }
    }
}

/// Environment variables that can override configuration.
pub mod env {
    pub const REALM: &str = "CHECKIN_TOKEN_REALM";
    pub const CLIENT_ID: &str = "CHECKIN_TOKEN_CLIENT_ID";
    pub const TOKENS_FILE: &str = "CHECKIN_TOKEN_FILE";
    pub const LOG_LEVEL: &str = "CHECKIN_TOKEN_LOG";
}

impl CheckinConfig {
    /// Apply environment variable overrides to the configuration.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(realm) = lookup(env::REALM).filter(|v| !v.is_empty()) {
            self.provider.realm_base = realm;
        }

        if let Some(client_id) = lookup(env::CLIENT_ID).filter(|v| !v.is_empty()) {
            self.client.client_id = client_id;
        }

        if let Some(file) = lookup(env::TOKENS_FILE).filter(|v| !v.is_empty()) {
            self.storage.tokens_file = PathBuf::from(file);
        }

        self
    }
}
