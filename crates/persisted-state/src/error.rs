//! Error types for the persisted state store.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::path::KeyPath;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// A value did not match the schema.
///
/// `path` is the dotted location of the offending field, `.` for the root.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("at `{path}`: {message}")]
pub struct DecodeError {
    pub path: String,
    pub message: String,
}

impl DecodeError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// A failure that is not tied to a particular field.
    pub fn at_root(message: impl Into<String>) -> Self {
        Self::new(".", message)
    }
}

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state does not match schema {0}")]
    Decode(#[from] DecodeError),

    #[error("failed to parse state file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid state path: \"{0}\"")]
    InvalidPath(KeyPath),

    #[error("state path must contain at least one key")]
    EmptyPath,

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid store config: {0}")]
    Config(String),
}

impl StateError {
    /// The underlying I/O error kind, if this is an I/O failure.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            StateError::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}
