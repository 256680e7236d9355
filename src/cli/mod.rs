//! CLI module for lodedb
//!
//! - init: write a default configuration file
//! - check: validate a configuration file
//! - run: open a database and serve JSON lines from stdin

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, LogLevel};
pub use commands::{check, init, load_config, run, run_command, serve, start};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_requests, write_response};
