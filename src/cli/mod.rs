//! Command-line interface for discovery-sync.
//!
//! This module provides the `sync` and `check-tools` commands.

mod commands;

pub use commands::{Cli, Commands, run_command};
