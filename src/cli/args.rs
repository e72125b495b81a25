//! CLI argument definitions using clap
//!
//! Commands:
//! - shipforms init --config <path>
//! - shipforms serve --config <path> [--port N] [--in-memory]
//! - shipforms forms
//! - shipforms revision next-create --count N
//! - shipforms revision next-update [--current LABEL]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// shipforms - revisioned maritime form records
#[derive(Parser, Debug)]
#[command(name = "shipforms")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data and upload directories
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./shipforms.json")]
        config: PathBuf,
    },

    /// Start the HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./shipforms.json")]
        config: PathBuf,

        /// Override the configured HTTP port
        #[arg(long)]
        port: Option<u16>,

        /// Keep records in memory only (uploads still go to disk)
        #[arg(long)]
        in_memory: bool,
    },

    /// Print the registered form types
    Forms,

    /// Compute revision labels without touching any data
    Revision {
        #[command(subcommand)]
        action: RevisionAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum RevisionAction {
    /// Label a new record would get given the current record count
    NextCreate {
        /// Number of records of the type that already exist
        #[arg(long)]
        count: u64,
    },

    /// Label an edited record would get
    NextUpdate {
        /// Label currently stored on the record
        #[arg(long)]
        current: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
