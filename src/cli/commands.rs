//! CLI command implementations
//!
//! `run` follows a fixed sequence: load config, open the database, serve
//! requests until EOF, then close the database so every admitted write is
//! committed before the process exits.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_requests, write_response};
use crate::api::{ApiHandler, Request, Response};
use crate::database::{Database, DatabaseConfig};
use crate::observability::Logger;
use crate::storage::WriterStats;

/// Parses arguments and runs the selected command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    Logger::set_min_severity(cli.log_level.into());
    run_command(cli.command)
}

pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Init { config } => init(&config),
        Command::Check { config } => check(&config, &mut io::stdout().lock()),
        Command::Run { config } => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            start(config.as_deref(), stdin.lock(), stdout.lock()).map(|_| ())
        }
    }
}

/// Writes a default configuration file. Refuses to overwrite.
pub fn init(path: &Path) -> CliResult<()> {
    if path.exists() {
        return Err(CliError::already_initialized(path));
    }
    let mut content = DatabaseConfig::default().to_json_pretty();
    content.push('\n');
    fs::write(path, content)
        .map_err(|e| CliError::io_error(format!("{}: {}", path.display(), e)))?;
    Ok(())
}

/// Validates a configuration file and prints the effective settings.
pub fn check<W: Write>(path: &Path, output: &mut W) -> CliResult<()> {
    let config = DatabaseConfig::load(path)?;
    writeln!(output, "{}", config.to_json_pretty())?;
    output.flush()?;
    Ok(())
}

pub fn load_config(path: Option<&Path>) -> CliResult<DatabaseConfig> {
    match path {
        Some(path) => Ok(DatabaseConfig::load(path)?),
        None => Ok(DatabaseConfig::default()),
    }
}

/// Opens a database, serves `input` and closes the database.
///
/// The database is closed even when serving fails; the serving error
/// takes precedence over a close error.
pub fn start<R: BufRead, W: Write>(
    config: Option<&Path>,
    input: R,
    output: W,
) -> CliResult<WriterStats> {
    let config = load_config(config)?;
    let db = Database::open(config).map_err(|e| CliError::boot_failed(e.to_string()))?;

    let served = serve(&db, input, output);
    let closed = db.close();

    served?;
    closed.map_err(|e| CliError::aborted(e.to_string()))
}

/// Answers every request line with one response line. Returns the number
/// of requests handled.
///
/// Stops early only on a fatal error, after writing its response.
pub fn serve<R: BufRead, W: Write>(db: &Database, input: R, mut output: W) -> CliResult<usize> {
    let handler = ApiHandler::new(db);
    let mut handled = 0;

    for line in read_requests(input) {
        let line = line?;
        handled += 1;

        match Request::parse(&line).and_then(|req| handler.handle(req)) {
            Ok(data) => write_response(&mut output, &Response::success(data))?,
            Err(err) => {
                write_response(&mut output, &Response::error(&err))?;
                if err.is_fatal() {
                    return Err(CliError::aborted(err.to_string()));
                }
            }
        }
    }

    Ok(handled)
}
