#![forbid(unsafe_code)]

use crate::{Board, ai_error};
use serde_json::Value;
use std::io::{BufRead, Write};

/// Requests larger than this are rejected without being parsed.
const MAX_LINE_BYTES: usize = 1024 * 1024;

fn write_newline_json(
    stdout: &mut std::io::StdoutLock<'_>,
    resp: &Value,
) -> Result<(), Box<dyn std::error::Error>> {
    writeln!(stdout, "{}", serde_json::to_string(resp)?)?;
    stdout.flush()?;
    Ok(())
}

fn parse_request(line: &str) -> Result<Value, Value> {
    if line.len() > MAX_LINE_BYTES {
        return Err(ai_error("INVALID_INPUT", "request exceeds max allowed size"));
    }
    serde_json::from_str::<Value>(line)
        .map_err(|err| ai_error("INVALID_INPUT", &format!("request is not JSON: {err}")))
}

/// One request per line in, one response per line out, until stdin closes.
pub(crate) fn run_stdio(board: &mut Board) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    let reader = stdin.lock();
    let mut stdout = std::io::stdout().lock();

    let mut handled = 0usize;
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let resp = match parse_request(trimmed) {
            Ok(request) => board.handle(request),
            Err(resp) => resp,
        };
        write_newline_json(&mut stdout, &resp)?;
        handled += 1;
    }

    tracing::info!(handled, failed_saves = board.session.failed_saves(), "stdin closed");
    Ok(())
}
