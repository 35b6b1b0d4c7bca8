//! checkin-token - EGI Check-in device flow credential helper
//!
//! Obtains OAuth 2.0 tokens through the device authorization grant, keeps
//! them in an owner-only JSON file, and refreshes or revokes them on demand.
//!
//! Exit status: 0 on success, 1 on operational failure, 2 on usage error,
//! 130 when interrupted.

mod auth;
mod cli;
mod client;
mod config;
mod error;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::auth::FileTokenStore;
use crate::cli::commands::build_controller;
use crate::cli::{Cli, Commands};
use crate::config::{load_config, settings::env};
use crate::error::Result;

/// Exit status when the user interrupts the process.
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(env::LOG_LEVEL)
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Run the command; an interrupt wins the race and leaves any token file untouched
    tokio::select! {
        result = run(cli) => {
            if let Err(e) = result {
                eprintln!("Error: {e}");
                if e.requires_restart() {
                    eprintln!("Start the flow again with 'checkin-token new'.");
                }
                std::process::exit(e.exit_code());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!();
            eprintln!("Aborted by user.");
            std::process::exit(EXIT_INTERRUPTED);
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        return cli::commands::handle_completions(shell);
    }

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(realm = %config.provider.realm_base, "Configuration loaded");

    match cli.command {
        Commands::New {
            client_id,
            scope,
            audience,
            file,
            timeout,
            open,
        } => {
            let controller = build_controller(&config, client_id, audience)?;
            let store = FileTokenStore::new(file.unwrap_or(config.storage.tokens_file));
            let scope = scope.unwrap_or(config.client.scope);
            let timeout = Duration::from_secs(timeout.unwrap_or(config.polling.timeout_secs));
            cli::commands::handle_new(&controller, &store, &scope, timeout, open).await
        },
        Commands::Refresh {
            client_id,
            audience,
            file,
            token,
        } => {
            let controller = build_controller(&config, client_id, audience)?;
            let store = FileTokenStore::new(file.unwrap_or(config.storage.tokens_file));
            cli::commands::handle_refresh(&controller, &store, token).await
        },
        Commands::Revoke {
            client_id,
            token,
            access_token,
        } => {
            let controller = build_controller(&config, client_id, None)?;
            cli::commands::handle_revoke(&controller, token, access_token).await
        },
        Commands::Completions { shell } => cli::commands::handle_completions(shell),
    }
}
