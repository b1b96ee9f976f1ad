//! JSON output for CLI
//!
//! - One JSON object per command on stdout
//! - Logs go to stderr, never stdout
//! - UTF-8 only

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;

/// Render a success envelope.
pub fn ok_envelope(data: Value) -> Value {
    serde_json::json!({
        "status": "ok",
        "data": data
    })
}

/// Render an error envelope.
pub fn error_envelope(code: &str, message: &str) -> Value {
    serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_line(&ok_envelope(data))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&error_envelope(code, message))
}

fn write_line(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelopes() {
        let ok = ok_envelope(serde_json::json!({"moved": 3}));
        assert_eq!(ok["status"], "ok");
        assert_eq!(ok["data"]["moved"], 3);

        let err = error_envelope("SNAPSHOT_FAILURE", "store unavailable");
        assert_eq!(err["status"], "error");
        assert_eq!(err["code"], "SNAPSHOT_FAILURE");
    }
}
