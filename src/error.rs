//! Error handling for the query engine
//!
//! This module provides the crate-level error type and result alias.

use std::io;
use thiserror::Error;

use crate::shard::ShardError;

/// Errors that can occur in query-engine operations
#[derive(Error, Debug)]
pub enum Error {
    /// Errors related to I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to parsing log data
    #[error("Parse error: {0}")]
    Parse(String),

    /// Errors related to configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to shard operations
    #[error("Shard error: {0}")]
    Shard(#[from] ShardError),

    /// Errors related to query execution
    #[error("Query error: {0}")]
    Query(String),

    /// Errors related to timestamp handling
    #[error("Timestamp error: {0}")]
    Timestamp(String),

    /// Broken internal invariant (indicates a bug, not a user error)
    #[error("Internal invariant violated: {0}")]
    Internal(String),
}

/// Result type for query-engine operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a new query error
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Create a new timestamp error
    pub fn timestamp(message: impl Into<String>) -> Self {
        Self::Timestamp(message.into())
    }

    /// Create a new internal invariant error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is an I/O error
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Check if this error should terminate the process.
    ///
    /// Fatal errors are I/O failures, shard failures, and broken internal
    /// invariants. Everything else is reported at the REPL boundary and only
    /// aborts the current query.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Shard(_) | Self::Internal(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {}", err))
    }
}
