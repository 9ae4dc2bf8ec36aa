//! Common error types for the NMRL services

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for NMRL operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the NMRL services
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A directory the cache builder scans does not exist
    #[error("Source directory not found: {}", .0.display())]
    SourceMissing(PathBuf),

    /// A git command exited unsuccessfully
    #[error("git {command} failed in {} (exit {status:?}): {stderr}", .dir.display())]
    Git {
        command: String,
        dir: PathBuf,
        status: Option<i32>,
        stderr: String,
    },

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors that mean "the thing isn't there yet" rather than a failure
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) | Error::SourceMissing(_) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
