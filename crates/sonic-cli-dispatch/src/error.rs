//! Error types for path dispatch.
//!
//! Every failure that leaves the dispatcher carries an [`ErrorKind`]. The
//! protocol layer maps the kind to its own status code; this crate only has
//! to pick the right kind.

use std::fmt;
use thiserror::Error;

/// Result type alias for command handlers and the dispatcher.
pub type CommandResult<T> = Result<T, CommandError>;

/// Classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed arity, bad option, or a caller-supplied value that fails validation.
    InvalidArgument,
    /// Unknown path, unknown named entity, or an unrecoverable upstream failure.
    NotFound,
    /// Serialization failure or other logic defect.
    Internal,
    /// The request was cancelled or hit its deadline while suspended.
    Cancelled,
}

impl ErrorKind {
    /// Returns the kind name as used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Internal => "Internal",
            ErrorKind::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request failure with its classification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct CommandError {
    /// How the protocol layer should report this failure.
    pub kind: ErrorKind,
    /// Human readable detail.
    pub message: String,
}

impl CommandError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Creates a cancelled error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// Returns the error classification.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(e: serde_json::Error) -> Self {
        CommandError::internal(format!("failed to serialize response: {}", e))
    }
}

/// Errors raised while building the registry at start-up.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The exact path already carries a handler or hints.
    #[error("path '{0}' is already registered")]
    Duplicate(String),

    /// The path is empty or contains an empty segment.
    #[error("invalid registration path '{0}'")]
    InvalidPath(String),

    /// Argument bounds are inverted.
    #[error("invalid argument bounds for '{path}': min {min} > max {max}")]
    InvalidBounds {
        /// The offending path.
        path: String,
        /// Declared minimum.
        min: usize,
        /// Declared maximum.
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CommandError::invalid_argument("unrecognized option 'foo'");
        assert_eq!(err.to_string(), "InvalidArgument: unrecognized option 'foo'");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_json_error_is_internal() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CommandError = json_err.into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::Duplicate("SHOW/arp".to_string());
        assert_eq!(err.to_string(), "path 'SHOW/arp' is already registered");
    }
}
