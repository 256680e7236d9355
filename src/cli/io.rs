//! Line-delimited JSON I/O
//!
//! - Input: one request object per line; blank lines are skipped
//! - Output: one response object per line, flushed after each
//! - UTF-8 only

use std::io::{BufRead, Write};

use super::errors::{CliError, CliResult};
use crate::api::Response;

/// Iterates non-blank request lines.
pub fn read_requests<R: BufRead>(input: R) -> impl Iterator<Item = CliResult<String>> {
    input
        .lines()
        .map(|line| line.map_err(CliError::from))
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
}

/// Writes one response line and flushes.
pub fn write_response<W: Write>(output: &mut W, response: &Response) -> CliResult<()> {
    writeln!(output, "{}", response.to_json())?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_lines_skipped() {
        let input = "{\"op\":\"sync\"}\n\n   \n{\"op\":\"stats\"}\n";
        let lines: Vec<String> = read_requests(input.as_bytes())
            .collect::<CliResult<_>>()
            .unwrap();
        assert_eq!(lines, vec!["{\"op\":\"sync\"}", "{\"op\":\"stats\"}"]);
    }

    #[test]
    fn test_write_response_is_one_line() {
        let mut out = Vec::new();
        write_response(&mut out, &Response::success(json!({"count": 3}))).unwrap();
        write_response(&mut out, &Response::ok()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed, json!({"status": "ok", "data": null}));
    }
}
