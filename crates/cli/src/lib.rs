//! `sellercheck` CLI internals, exposed as a library so integration tests
//! can drive the command bodies without spawning the binary.

pub mod cache_cmd;
pub mod exit_codes;
pub mod fetch;
pub mod optimize;
pub mod providers;
pub mod validate;

use exit_codes::{EXIT_IO, EXIT_USAGE};

/// CLI-level error: an exit code, a message for stderr, and an optional
/// one-line hint.
#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }
}

/// Read a document from a path, or from stdin when the path is `-`.
pub fn read_input(path: &std::path::Path) -> Result<String, CliError> {
    use std::io::Read;

    if path == std::path::Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::io(format!("cannot read stdin: {e}")))?;
        return Ok(buf);
    }

    std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))
}

/// Write text to a path, or to stdout when no path is given.
pub fn write_output(text: &str, out: &Option<std::path::PathBuf>) -> Result<(), CliError> {
    use std::io::Write;

    match out {
        Some(path) => std::fs::write(path, text)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display()))),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(text.as_bytes())
                .map_err(|e| CliError::io(format!("cannot write stdout: {e}")))
        }
    }
}
