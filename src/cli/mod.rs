//! CLI module for shipforms
//!
//! Provides command-line interface for:
//! - init: Create data and upload directories
//! - serve: Run the HTTP API
//! - forms: Print the form registry
//! - revision: Compute revision labels offline

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command, RevisionAction};
pub use commands::{build_state, init, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_response;
