//! Error types for tributary-jsonl operations.

use std::io;
use thiserror::Error;

/// The error type for tributary-jsonl operations.
///
/// Only infrastructure failures surface here. Bad individual lines are
/// reported as [`crate::Warning`] values by the resilient reader.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file is not usable as JSON Lines at all.
    #[error("Invalid JSONL format: {0}")]
    InvalidFormat(String),
}

/// A specialized Result type for tributary-jsonl operations.
pub type Result<T> = std::result::Result<T, Error>;
