//! EGI Check-in provider defaults.

/// Keycloak realm serving the OpenID Connect endpoints.
pub const REALM_BASE: &str = "https://aai.egi.eu/auth/realms/egi/protocol/openid-connect";

/// Public client registered for command-line agents.
pub const DEFAULT_CLIENT_ID: &str = "oidc-agent";

/// Scopes requested for a new token set.
pub const DEFAULT_SCOPE: &str = "openid offline_access profile email";

/// Device authorization endpoint path, relative to the realm base.
pub const DEVICE_AUTHORIZATION_PATH: &str = "auth/device";

/// Token endpoint path, relative to the realm base.
pub const TOKEN_PATH: &str = "token";

/// Revocation endpoint path, relative to the realm base.
pub const REVOCATION_PATH: &str = "revocation";
