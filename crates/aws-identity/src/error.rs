//! Error types for the identity manager.
//!
//! All errors are strongly typed and propagated without panicking.
//! Secret access keys never appear in error messages: records are
//! rendered through their masking `Debug` implementation.

use crate::identity::Identity;

/// Identity manager error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Cannot store {identity:?}, it already exists as {existing:?}")]
    Conflict {
        identity: Box<Identity>,
        existing: Box<Identity>,
    },

    #[error("Identity not found: {0}")]
    NotFound(String),

    #[error("Malformed identity record: {0}")]
    MalformedRecord(String),

    #[error("Malformed import row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IdentityError {
    /// Return `true` if this is a recoverable key conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, IdentityError::Conflict { .. })
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, IdentityError>;
