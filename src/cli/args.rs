//! CLI argument definitions using clap
//!
//! Commands:
//! - hoarder init --config <path>
//! - hoarder serve --config <path> [--port <port>]
//! - hoarder put <key> [--file <path>]
//! - hoarder get <key> [--out <path>]
//! - hoarder stat <key>
//! - hoarder rm <key>
//! - hoarder ls [--after <key>] [--limit <n>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hoarder - A small, durable blob store
#[derive(Parser, Debug)]
#[command(name = "hoarder")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./hoarder.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration (if missing) and create the backend root
    Init,

    /// Serve the HTTP API
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Store a blob, reading from stdin unless --file is given
    Put {
        key: String,
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Fetch a blob, writing to stdout unless --out is given
    Get {
        key: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show a blob's size and modification time
    Stat { key: String },

    /// Remove a blob
    Rm { key: String },

    /// List blobs in key order
    Ls {
        /// Only keys strictly after this one
        #[arg(long)]
        after: Option<String>,
        /// Maximum number of entries
        #[arg(long)]
        limit: Option<usize>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
