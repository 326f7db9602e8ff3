//! Optional `rustfmt` pass over generated text

use std::env;
use std::io::Write;
use std::process::{Command, Stdio};

use thiserror::Error;

/// Why `rustfmt` could not format the unit
#[derive(Debug, Error)]
pub enum FormatError {
    /// The formatter could not be started or fed
    #[error("failed to run {program}")]
    Spawn {
        /// Formatter binary
        program: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The formatter rejected the input
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        /// Formatter binary
        program: String,
        /// Exit status
        status: std::process::ExitStatus,
        /// Captured diagnostics
        stderr: String,
    },

    /// The formatter wrote something other than UTF-8
    #[error("{program} produced non UTF-8 output")]
    Utf8 {
        /// Formatter binary
        program: String,
    },
}

/// Formatter binary: `$RUSTFMT` or `rustfmt` from `PATH`
pub fn rustfmt_program() -> String {
    env::var("RUSTFMT").unwrap_or_else(|_| "rustfmt".to_string())
}

/// Pipe `text` through `rustfmt --edition 2021`
pub fn rustfmt(text: &str) -> Result<String, FormatError> {
    let program = rustfmt_program();
    let spawn = |source| FormatError::Spawn {
        program: program.clone(),
        source,
    };

    let mut child = Command::new(&program)
        .args(["--edition", "2021"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes()).map_err(spawn)?;
    }
    let output = child.wait_with_output().map_err(spawn)?;

    if !output.status.success() {
        return Err(FormatError::Failed {
            program,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    String::from_utf8(output.stdout).map_err(|_| FormatError::Utf8 { program })
}

/// Format `text`, falling back to the unformatted text with a warning
pub fn format_or_raw(text: String) -> String {
    match rustfmt(&text) {
        Ok(formatted) => formatted,
        Err(err) => {
            tracing::warn!(error = %err, "formatting generated code failed; emitting unformatted output");
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_keeps_raw_text() {
        let raw = "fn main( {".to_string();
        // Either rustfmt is missing or it rejects the input; both fall back.
        assert_eq!(format_or_raw(raw.clone()), raw);
    }
}
