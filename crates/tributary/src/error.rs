//! Error types for tributary operations.
//!
//! Graph algorithms in this crate are total: missing anchors return empty
//! results and dangling references are skipped. Errors here come from the
//! edges of the system (files, configuration, the CLI).

use crate::domain::NodeId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for tributary operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Storage error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The requested node does not exist in the graph.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
}

/// Problems locating or reading the `.tributary/` workspace.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.tributary/` directory was found walking up from the start path.
    #[error("Not a tributary workspace (no .tributary/ found from {0}). Run 'tributary init' first.")]
    NotInitialized(PathBuf),

    /// `init` was run in a directory that is already initialized.
    #[error("Tributary is already initialized in {0}. Use --force to reinitialize.")]
    AlreadyInitialized(PathBuf),

    /// The config file exists but could not be parsed.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// Path of the config file
        path: PathBuf,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// The config could not be serialized for writing.
    #[error("Failed to write config file {path}: {source}")]
    Write {
        /// Path of the config file
        path: PathBuf,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },
}

/// Problems reading or writing graph snapshot files.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A snapshot file could not be used at all.
    #[error("Invalid snapshot file {path}: {reason}")]
    InvalidFormat {
        /// Offending file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Writing a snapshot or layout file failed.
    #[error("Failed to write {path}: {source}")]
    Serialization {
        /// Target file
        path: PathBuf,
        /// Underlying JSONL error
        #[source]
        source: tributary_jsonl::Error,
    },
}

/// A specialized Result type for tributary operations.
pub type Result<T> = std::result::Result<T, Error>;
