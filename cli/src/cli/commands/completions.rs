//! Shell completion generation.

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::args::ShellType;
use crate::cli::Cli;
use crate::error::Result;

/// Handles the `checkin-token completions <shell>` command.
pub fn handle_completions(shell: ShellType) -> Result<()> {
    let mut cmd = Cli::command();
    let shell = match shell {
        ShellType::Bash => Shell::Bash,
        ShellType::Zsh => Shell::Zsh,
        ShellType::Fish => Shell::Fish,
    };

    generate(shell, &mut cmd, "checkin-token", &mut std::io::stdout());

    Ok(())
}
