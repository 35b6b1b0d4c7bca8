//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// EGI Check-in device flow credential helper.
///
/// Obtains tokens through the OAuth 2.0 device authorization grant, stores
/// them in an owner-only JSON file, and refreshes or revokes them later.
#[derive(Parser, Debug)]
#[command(name = "checkin-token")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = "Examples:
  checkin-token new
  checkin-token new --audience interlink --file my_tokens.json
  checkin-token refresh --file my_tokens.json
  checkin-token refresh --token eyJhbG...
  checkin-token revoke --token eyJhbG... --access-token eyJhbG...")]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Read configuration from this file instead of the default location.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Get new tokens via device flow.
    New {
        /// OIDC client_id (default: oidc-agent).
        #[arg(long)]
        client_id: Option<String>,

        /// OIDC scopes (default: "openid offline_access profile email").
        #[arg(long)]
        scope: Option<String>,

        /// Optional audience parameter (filters audiences if configured).
        #[arg(long)]
        audience: Option<String>,

        /// Where to store tokens JSON (default: tokens_egi.json).
        #[arg(long)]
        file: Option<PathBuf>,

        /// Give up polling after this many seconds (default: 900).
        #[arg(long, value_name = "SECONDS")]
        timeout: Option<u64>,

        /// Open the verification URL in the default browser.
        #[arg(long)]
        open: bool,
    },

    /// Refresh tokens using saved file or explicit token.
    Refresh {
        /// OIDC client_id (default: oidc-agent).
        #[arg(long)]
        client_id: Option<String>,

        /// Optional audience parameter (filters audiences if configured).
        #[arg(long)]
        audience: Option<String>,

        /// Where to read/store tokens JSON (default: tokens_egi.json).
        #[arg(long)]
        file: Option<PathBuf>,

        /// Provide refresh token directly instead of reading from file.
        #[arg(long, value_name = "REFRESH_TOKEN")]
        token: Option<String>,
    },

    /// Revoke a refresh token using a valid access token.
    Revoke {
        /// OIDC client_id (default: oidc-agent).
        #[arg(long)]
        client_id: Option<String>,

        /// Refresh token to revoke.
        #[arg(long, value_name = "REFRESH_TOKEN")]
        token: Option<String>,

        /// Valid access token to authenticate the revoking request.
        #[arg(long, value_name = "ACCESS_TOKEN")]
        access_token: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: ShellType,
    },
}

/// Shell types for completions.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
}
