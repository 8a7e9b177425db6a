//! CLI module for hoarder
//!
//! Provides command-line interface for:
//! - init: Write a default config and create the backend root
//! - serve: Run the HTTP API
//! - put/get/stat/rm/ls: One-shot operations against the configured backend

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{get, init, ls, put, rm, run, run_command, serve, stat, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
