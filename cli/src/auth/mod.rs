//! Authentication module for checkin-token.
//!
//! This module provides the OAuth device flow against the identity provider,
//! token refresh and revocation, and the owner-only token file.

pub mod controller;
pub mod credentials;
pub mod device_flow;
pub mod providers;
pub mod tokens;

pub use controller::TokenFlowController;
pub use credentials::{FileTokenStore, TokenStore};
pub use device_flow::{open_browser, DEFAULT_POLL_TIMEOUT};
pub use providers::ProviderEndpoints;
