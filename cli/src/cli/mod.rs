//! CLI module for checkin-token.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
