//! Token types for the device flow.

use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Poll interval the provider is assumed to want when it does not say.
const DEFAULT_INTERVAL_SECS: u64 = 5;

/// Number of characters of a secret shown in summaries.
const SECRET_PREVIEW_CHARS: usize = 20;

/// Response from the device authorization endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceAuthorizationResponse {
    /// Secret polled against the token endpoint. Never shown to the user.
    pub device_code: String,
    /// Code for the user to enter.
    pub user_code: String,
    /// URL for the user to visit.
    pub verification_uri: String,
    /// URL with the user code already filled in.
    #[serde(default)]
    pub verification_uri_complete: Option<String>,
    /// Poll cadence suggested by the provider, in seconds.
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// Lifetime of the device code, in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

const fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

impl DeviceAuthorizationResponse {
    /// URL to open directly, falling back to the plain verification URL.
    #[must_use]
    pub fn direct_uri(&self) -> &str {
        self.verification_uri_complete
            .as_deref()
            .unwrap_or(&self.verification_uri)
    }
}

/// Token set issued by the identity provider.
///
/// The provider's JSON object is kept as received, so fields not modelled
/// here (`token_type`, `scope`, `session_state`, ...), explicit `null`s and
/// non-integer numbers are written back unchanged. Known fields are read
/// through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct TokenSet {
    fields: Map<String, Value>,
}

impl TryFrom<Map<String, Value>> for TokenSet {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        match fields.get("access_token") {
            Some(Value::String(_)) => Ok(Self { fields }),
            Some(other) => Err(format!("access_token must be a string, got {other}")),
            None => Err("missing field `access_token`".to_string()),
        }
    }
}

impl From<TokenSet> for Map<String, Value> {
    fn from(tokens: TokenSet) -> Self {
        tokens.fields
    }
}

impl TokenSet {
    /// The access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        self.str_field("access_token").unwrap_or_default()
    }

    /// The refresh token (if provided).
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.str_field("refresh_token")
    }

    /// The OpenID Connect ID token (if provided).
    #[must_use]
    pub fn id_token(&self) -> Option<&str> {
        self.str_field("id_token")
    }

    /// Access token lifetime in seconds.
    #[must_use]
    pub fn expires_in(&self) -> Option<u64> {
        self.secs_field("expires_in")
    }

    /// Refresh token lifetime in seconds.
    #[must_use]
    pub fn refresh_expires_in(&self) -> Option<u64> {
        self.secs_field("refresh_expires_in")
    }

    /// Raw value of any field, as the provider sent it.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The refresh token, if one is present and non-empty.
    #[must_use]
    pub fn usable_refresh_token(&self) -> Option<&str> {
        self.refresh_token().filter(|t| !t.is_empty())
    }

    /// Combine a stored token set with a refresh response.
    ///
    /// Fields present in `refreshed` win; fields it omits, such as an
    /// unrotated refresh token, are carried over from `self`.
    #[must_use]
    pub fn merged_with(&self, refreshed: Self) -> Self {
        let mut fields = self.fields.clone();
        fields.extend(refreshed.fields);
        Self { fields }
    }

    /// Local time at which the access token expires, counted from `issued_at`.
    #[must_use]
    pub fn expires_at(&self, issued_at: DateTime<Local>) -> Option<DateTime<Local>> {
        let secs = i64::try_from(self.expires_in()?).ok()?;
        Some(issued_at + Duration::seconds(secs))
    }

    /// Human-readable summary with secrets truncated.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("  access_token:  {}", preview(Some(self.access_token()))),
            format!("  refresh_token: {}", preview(self.refresh_token())),
            format!("  id_token:      {}", preview(self.id_token())),
        ];

        match self.expires_in() {
            Some(secs) => {
                let until = self
                    .expires_at(Local::now())
                    .map(|at| format!(" (until {})", at.format("%Y-%m-%d %H:%M:%S")))
                    .unwrap_or_default();
                lines.push(format!("  expires_in:    {secs} seconds{until}"));
            },
            None => lines.push("  expires_in:    unknown".to_string()),
        }

        if let Some(secs) = self.refresh_expires_in() {
            lines.push(format!("  refresh_expires_in: {secs} seconds"));
        }

        lines.join("\n")
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Lifetimes are whole seconds; `3600.0` reads as 3600, anything negative
    /// or non-numeric as absent.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn secs_field(&self, key: &str) -> Option<u64> {
        let value = self.fields.get(key)?;
        value.as_u64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        })
    }
}

fn preview(secret: Option<&str>) -> String {
    match secret {
        Some(s) if !s.is_empty() => {
            let head: String = s.chars().take(SECRET_PREVIEW_CHARS).collect();
            format!("{head}...")
        },
        _ => "None".to_string(),
    }
}
