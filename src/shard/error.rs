//! Error types for the shard module
//!
//! Defines error types specific to shard splitting, loading, and lookup.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during shard operations
#[derive(Error, Debug)]
pub enum ShardError {
    /// A required file is missing
    #[error("File not found: {0}")]
    Missing(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record line could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// File error with path context
    #[error("File error for {path:?}: {message}")]
    File { path: PathBuf, message: String },
}

/// Result type for shard operations
pub type ShardResult<T> = std::result::Result<T, ShardError>;

impl ShardError {
    /// Create a new missing-file error
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self::Missing(path.into())
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new file error
    pub fn file_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this is a missing-file error
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_))
    }

    /// Check if this is an I/O error
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
