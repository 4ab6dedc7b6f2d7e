//! Error types for the show client.
//!
//! Collaborator failures (Redis, host commands, output parsing) are
//! [`ShowError`]s. Handlers turn them into a [`CommandError`] at the
//! boundary; everything upstream of a handler is reported as `NotFound`
//! except serialization, which is a logic defect and reported as `Internal`.

use sonic_cli_dispatch::{CommandError, ErrorKind};
use thiserror::Error;

/// Errors raised by the data collaborators of a show command.
#[derive(Debug, Error)]
pub enum ShowError {
    /// Redis connection or command failed.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// A database or table could not be queried.
    #[error("Database query failed: {operation}: {message}")]
    Database {
        /// The operation that failed (e.g., "keys", "hgetall").
        operation: String,
        /// Error message.
        message: String,
    },

    /// A host command could not be run or exited non-zero.
    #[error("Host command '{command}' failed: {message}")]
    HostCommand {
        /// The command line.
        command: String,
        /// Error message.
        message: String,
    },

    /// Stored data or command output did not have the expected shape.
    #[error("Failed to parse {what}: {message}")]
    Parse {
        /// What was being parsed.
        what: String,
        /// Error message.
        message: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration for {field}: {message}")]
    Config {
        /// The offending field.
        field: String,
        /// Error message.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode or decode failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for show-client operations.
pub type ShowResult<T> = Result<T, ShowError>;

impl ShowError {
    /// Creates a database error.
    pub fn database(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Database {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a host command error.
    pub fn host_command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HostCommand {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The kind a handler reports when it cannot recover from this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShowError::Json(_) => ErrorKind::Internal,
            _ => ErrorKind::NotFound,
        }
    }
}

impl From<ShowError> for CommandError {
    fn from(e: ShowError) -> Self {
        CommandError::new(e.kind(), e.to_string())
    }
}
