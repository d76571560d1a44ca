//! Error types and handling infrastructure for jlv.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! custom error types and `anyhow` for application-level error handling with context.
//!
//! Most failures in jlv are deliberately non-fatal: I/O and decode problems are
//! recorded on the [`File`](crate::file::File) and surfaced on the status row
//! while the session keeps running. The variants here cover both those recorded
//! errors and the few genuinely fatal conditions (terminal setup, input channel
//! closure).

use thiserror::Error;

/// The main error type for jlv operations.
#[derive(Error, Debug)]
pub enum JlvError {
    /// Read/seek failures on the underlying byte source.
    #[error("File operation failed: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON on a line; the line number is 0-based.
    #[error("line {line}: invalid JSON record")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Invalid regular expression in a filter or search mask.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Unrecognized or malformed command text.
    #[error("{input}: undefined command")]
    Command { input: String },

    /// Terminal detection or raw-mode setup failures; fatal to the
    /// interactive session, the caller falls back to a plain dump.
    #[error("Terminal error: {message}")]
    Terminal { message: String },

    /// The input reader signalled closure; terminates the session loop.
    #[error("input channel closed")]
    InputClosed,

    /// Configuration file problems.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Generic error for cases not covered by specific variants.
    #[error("Operation failed: {message}")]
    Other { message: String },
}

/// Standard Result type for jlv operations.
pub type Result<T> = std::result::Result<T, JlvError>;

impl JlvError {
    /// Create an Io error from an io::Error with additional context.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a Decode error for the given line.
    pub fn decode(line: usize, source: serde_json::Error) -> Self {
        Self::Decode { line, source }
    }

    /// Create a Command error echoing the offending input.
    pub fn command(input: impl Into<String>) -> Self {
        Self::Command {
            input: input.into(),
        }
    }

    /// Create a Terminal error with a descriptive message.
    pub fn terminal(message: impl Into<String>) -> Self {
        Self::Terminal {
            message: message.into(),
        }
    }

    /// Create a Config error with a descriptive message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a generic Other error with a descriptive message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

// Automatic conversion from io::Error to JlvError
impl From<std::io::Error> for JlvError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "IO operation failed".to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let cmd = JlvError::command(":zz");
        assert_eq!(cmd.to_string(), ":zz: undefined command");

        let term = JlvError::terminal("not a terminal");
        assert_eq!(term.to_string(), "Terminal error: not a terminal");

        let decode =
            JlvError::decode(7, serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        assert_eq!(decode.to_string(), "line 7: invalid JSON record");
    }

    #[test]
    fn test_error_constructors() {
        let other = JlvError::other("unknown");
        assert!(matches!(other, JlvError::Other { .. }));

        let cfg = JlvError::config("bad toml");
        assert!(matches!(cfg, JlvError::Config { .. }));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: JlvError = io_err.into();

        match err {
            JlvError::Io { message, .. } => assert_eq!(message, "IO operation failed"),
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_pattern_error_conversion() {
        let regex_err = regex::Regex::new("(").unwrap_err();
        let err: JlvError = regex_err.into();
        assert!(matches!(err, JlvError::Pattern(_)));
    }
}
