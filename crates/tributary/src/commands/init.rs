//! Implementation of the `init` command.
//!
//! Creates the `.tributary/` directory with a default configuration and
//! empty snapshot files.

use crate::config::{CONFIG_FILE_NAME, TRIBUTARY_DIR_NAME, TributaryConfig};
use crate::error::{ConfigError, Result};
use crate::store::SnapshotPaths;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the gitignore file within `.tributary`
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

const GITIGNORE_CONTENT: &str = "\
# Generated by `tributary layout --save`; recomputed from the snapshot files
layout.json
";

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the `.tributary` directory
    pub tributary_dir: PathBuf,
    /// Path to the config file
    pub config_file: PathBuf,
    /// Paths to the snapshot files
    pub snapshot: SnapshotPaths,
    /// Path to the gitignore file
    pub gitignore_file: PathBuf,
    /// Whether an existing workspace was reinitialized
    pub reinitialized: bool,
}

/// Initialize a tributary workspace in `base_dir`.
///
/// With `force`, an existing workspace gets a fresh default config; snapshot
/// files that already exist are left alone.
///
/// # Errors
///
/// Returns [`ConfigError::AlreadyInitialized`] if `.tributary/` exists and
/// `force` is not set, or an IO error if files cannot be created.
pub async fn init(base_dir: &Path, force: bool) -> Result<InitResult> {
    let tributary_dir = base_dir.join(TRIBUTARY_DIR_NAME);
    let reinitialized = is_initialized(base_dir);

    if reinitialized && !force {
        return Err(ConfigError::AlreadyInitialized(base_dir.to_path_buf()).into());
    }

    fs::create_dir_all(&tributary_dir).await?;

    let config = TributaryConfig::default();
    let config_file = tributary_dir.join(CONFIG_FILE_NAME);
    config.save(&config_file).await?;

    let snapshot = config.graph.snapshot_paths(base_dir);
    for path in [&snapshot.nodes, &snapshot.edges, &snapshot.flows] {
        if !fs::try_exists(path).await? {
            fs::write(path, "").await?;
        }
    }

    let gitignore_file = tributary_dir.join(GITIGNORE_FILE_NAME);
    fs::write(&gitignore_file, GITIGNORE_CONTENT).await?;

    tracing::debug!(dir = %tributary_dir.display(), reinitialized, "Initialized workspace");

    Ok(InitResult {
        tributary_dir,
        config_file,
        snapshot,
        gitignore_file,
        reinitialized,
    })
}

/// Check if a directory has been initialized.
///
/// Returns `true` if the `.tributary/` directory exists.
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(TRIBUTARY_DIR_NAME).is_dir()
}
