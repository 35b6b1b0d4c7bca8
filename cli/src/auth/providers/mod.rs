//! OAuth provider endpoint configuration.

pub mod egi;

use oauth2::{DeviceAuthorizationUrl, RevocationUrl, TokenUrl};
use url::Url;

use crate::config::ProviderSettings;
use crate::error::{CheckinError, Result};

/// The three endpoints a device-flow provider exposes.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    /// Device authorization endpoint.
    pub device_authorization: DeviceAuthorizationUrl,
    /// Token endpoint, used for polling and refreshing.
    pub token: TokenUrl,
    /// Token revocation endpoint.
    pub revocation: RevocationUrl,
}

impl ProviderEndpoints {
    /// Derive all three endpoints from a Keycloak realm base URL.
    ///
    /// # Errors
    ///
    /// Returns [`CheckinError::InvalidUrl`] if the base URL cannot be parsed.
    pub fn from_realm(realm_base: &str) -> Result<Self> {
        let base = realm_url(realm_base)?;

        Ok(Self {
            device_authorization: DeviceAuthorizationUrl::from_url(
                base.join(egi::DEVICE_AUTHORIZATION_PATH)?,
            ),
            token: TokenUrl::from_url(base.join(egi::TOKEN_PATH)?),
            revocation: RevocationUrl::from_url(base.join(egi::REVOCATION_PATH)?),
        })
    }

    /// Build endpoints from settings; explicit URLs override the realm-derived ones.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured URL is invalid.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let mut endpoints = Self::from_realm(&settings.realm_base)?;

        if let Some(url) = &settings.device_authorization_url {
            endpoints.device_authorization = DeviceAuthorizationUrl::new(url.clone())
                .map_err(|e| CheckinError::Config(format!("Invalid device auth URL: {e}")))?;
        }
        if let Some(url) = &settings.token_url {
            endpoints.token = TokenUrl::new(url.clone())
                .map_err(|e| CheckinError::Config(format!("Invalid token URL: {e}")))?;
        }
        if let Some(url) = &settings.revocation_url {
            endpoints.revocation = RevocationUrl::new(url.clone())
                .map_err(|e| CheckinError::Config(format!("Invalid revocation URL: {e}")))?;
        }

        Ok(endpoints)
    }
}

/// Parse the realm base so that relative joins append instead of replacing the last segment.
fn realm_url(realm_base: &str) -> Result<Url> {
    let trimmed = realm_base.trim_end_matches('/');
    Ok(Url::parse(&format!("{trimmed}/"))?)
}
