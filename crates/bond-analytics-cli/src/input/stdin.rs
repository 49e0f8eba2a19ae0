use serde_json::Value;
use std::io::{self, Read};

/// Read a piped JSON input object from stdin.
///
/// Every bondcalc subcommand takes the same shape on stdin as via
/// `--input`: a single JSON object with the fields of that computation's
/// input struct. Returns `None` when stdin is an interactive TTY or the
/// pipe is empty, so the caller can say which input it was expecting.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| format!("piped stdin is not valid JSON: {e}"))?;
    Ok(Some(value))
}
