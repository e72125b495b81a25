//! JSON output for CLI commands
//!
//! Every successful command prints a single JSON object on stdout. Errors
//! are reported by `main` on stderr.

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;

/// Build the success envelope
pub fn response_envelope(data: Value) -> Value {
    serde_json::json!({
        "status": "ok",
        "data": data
    })
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_value(&response_envelope(data))
}

fn write_value(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_envelope() {
        assert_eq!(
            response_envelope(json!({"revisionNo": "2.0"})),
            json!({"status": "ok", "data": {"revisionNo": "2.0"}})
        );
    }
}
