//! CLI argument definitions using clap
//!
//! Commands:
//! - lodedb init --config <path>
//! - lodedb check --config <path>
//! - lodedb run [--config <path>]

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::observability::Severity;

/// lodedb - an embedded document store with a single-writer commit path
#[derive(Parser, Debug)]
#[command(name = "lodedb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Minimum severity written to the stderr log
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default configuration file
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./lodedb.json")]
        config: PathBuf,
    },

    /// Validate a configuration file and print the effective settings
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./lodedb.json")]
        config: PathBuf,
    },

    /// Open a database and serve JSON requests from stdin until EOF
    Run {
        /// Path to configuration file; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Info,
    Warn,
    Error,
    Fatal,
}

impl From<LogLevel> for Severity {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Severity::Trace,
            LogLevel::Info => Severity::Info,
            LogLevel::Warn => Severity::Warn,
            LogLevel::Error => Severity::Error,
            LogLevel::Fatal => Severity::Fatal,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
