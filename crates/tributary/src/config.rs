//! Workspace configuration (`.tributary/config.yaml`).
//!
//! Every section and field has a default, so a partial or empty file is
//! valid. Relative paths are resolved against the workspace root, the
//! directory that contains `.tributary/`.

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::{ConfigError, Result};
use crate::layout::LayoutConfig;
use crate::store::SnapshotPaths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the workspace directory
pub const TRIBUTARY_DIR_NAME: &str = ".tributary";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Maximum number of parent directories searched for the workspace root
pub const MAX_ROOT_SEARCH_DEPTH: usize = 256;

/// Default depth for `tributary view`
pub const DEFAULT_VIEW_DEPTH: u32 = 2;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TributaryConfig {
    /// Snapshot and layout file locations
    pub graph: GraphFiles,

    /// Lineage cache sizing
    pub cache: CacheConfig,

    /// Layout spacing
    pub layout: LayoutConfig,

    /// Defaults for `tributary view`
    pub view: ViewConfig,
}

/// Where the graph lives on disk, relative to the workspace root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphFiles {
    /// Nodes JSONL file
    pub nodes_file: String,

    /// Edges JSONL file
    pub edges_file: String,

    /// Flows JSONL file
    pub flows_file: String,

    /// Saved global layout
    pub layout_file: String,
}

impl Default for GraphFiles {
    fn default() -> Self {
        Self {
            nodes_file: format!("{TRIBUTARY_DIR_NAME}/nodes.jsonl"),
            edges_file: format!("{TRIBUTARY_DIR_NAME}/edges.jsonl"),
            flows_file: format!("{TRIBUTARY_DIR_NAME}/flows.jsonl"),
            layout_file: format!("{TRIBUTARY_DIR_NAME}/layout.json"),
        }
    }
}

impl GraphFiles {
    /// Snapshot file paths resolved against `root`.
    pub fn snapshot_paths(&self, root: &Path) -> SnapshotPaths {
        SnapshotPaths {
            nodes: root.join(&self.nodes_file),
            edges: root.join(&self.edges_file),
            flows: root.join(&self.flows_file),
        }
    }

    /// Layout file path resolved against `root`.
    pub fn layout_path(&self, root: &Path) -> PathBuf {
        root.join(&self.layout_file)
    }
}

/// Cache section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached views
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// View section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Upstream depth when `-u` is not given
    pub upstream_depth: u32,

    /// Downstream depth when `-d` is not given
    pub downstream_depth: u32,

    /// Name layers after their models' prefixes instead of their distance
    pub smart_layer_names: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            upstream_depth: DEFAULT_VIEW_DEPTH,
            downstream_depth: DEFAULT_VIEW_DEPTH,
            smart_layer_names: true,
        }
    }
}

impl TributaryConfig {
    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid YAML, or an IO error if the
    /// file cannot be read.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    /// Save configuration to a file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, content).await?;
        Ok(())
    }
}

/// Find the workspace root by searching up the directory tree.
///
/// Returns the directory that contains `.tributary/`, or `None` if none is
/// found before the filesystem root or [`MAX_ROOT_SEARCH_DEPTH`] parents.
pub fn find_tributary_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(TRIBUTARY_DIR_NAME).is_dir() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_ROOT_SEARCH_DEPTH || !current.pop() {
            return None;
        }
    }
}
