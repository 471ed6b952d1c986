//! Error types for Courtside core operations.

use thiserror::Error;

/// The error type for core parsing and persistence operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An identifier string could not be parsed.
    #[error("invalid {kind} id '{value}'")]
    InvalidId {
        /// The kind of identifier that was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// The provided input was invalid.
    #[error("invalid input: {field} - {message}")]
    InvalidInput {
        /// The field that was invalid.
        field: &'static str,
        /// A description of why the input was invalid.
        message: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new invalid id error.
    #[must_use]
    pub fn invalid_id(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidId {
            kind,
            value: value.into(),
        }
    }

    /// Creates a new invalid input error.
    #[must_use]
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }
}
