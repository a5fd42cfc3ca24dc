//! Error types for the binary's fallible edges.
//!
//! The hierarchy itself never fails; stale handles and out-of-range positions
//! come back as `None`. What can fail is reading batch input and writing output.

use std::io;

/// Errors surfaced by the command handlers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_the_line() {
        let err = Error::parse(3, "unknown action 'frobnicate'");
        assert_eq!(err.to_string(), "line 3: unknown action 'frobnicate'");
    }

    #[test]
    fn io_errors_convert() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "missing.txt").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "missing.txt");
    }
}
