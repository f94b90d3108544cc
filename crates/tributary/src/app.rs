//! Application context for CLI command execution.
//!
//! [`App`] locates the workspace, loads its configuration and snapshot, and
//! owns the [`LineageService`] commands run against.
//!
//! # Example
//!
//! ```no_run
//! use tributary::app::App;
//! use tributary::store::GraphStore;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     println!("{} nodes", app.service().store().get_all_nodes().await?.len());
//!     Ok(())
//! }
//! ```

use crate::config::{CONFIG_FILE_NAME, TRIBUTARY_DIR_NAME, TributaryConfig, find_tributary_root};
use crate::error::{ConfigError, Result};
use crate::layer_naming::{LayerNamer, PlainLayerNamer, PrefixLayerNamer};
use crate::layout::SavedLayout;
use crate::service::LineageService;
use crate::store::in_memory::load_from_jsonl;
use crate::store::{LoadWarning, layout_file};
use std::path::{Path, PathBuf};

/// Application context for CLI operations.
#[derive(Debug)]
pub struct App {
    service: LineageService,
    config: TributaryConfig,
    /// Directory containing `.tributary/`
    root: PathBuf,
    warnings: Vec<LoadWarning>,
}

impl App {
    /// Create an App from the given working directory.
    ///
    /// Searches up the directory tree for `.tributary/`, loads the config
    /// and the graph snapshot. Load warnings are logged and kept on the
    /// app for `info` to report.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No workspace is found in the directory tree
    /// - The configuration cannot be loaded
    /// - A snapshot file exists but cannot be read
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root = find_tributary_root(working_dir)
            .ok_or_else(|| ConfigError::NotInitialized(working_dir.to_path_buf()))?;
        let config_path = root.join(TRIBUTARY_DIR_NAME).join(CONFIG_FILE_NAME);
        let config = TributaryConfig::load(&config_path).await?;

        let (store, warnings) = load_from_jsonl(&config.graph.snapshot_paths(&root)).await?;
        for warning in &warnings {
            tracing::warn!("{warning}");
        }

        let namer: Box<dyn LayerNamer> = if config.view.smart_layer_names {
            Box::new(PrefixLayerNamer)
        } else {
            Box::new(PlainLayerNamer)
        };
        let service = LineageService::new(store, config.cache.capacity)
            .with_layout_config(config.layout.clone())
            .with_layer_namer(namer);

        Ok(Self {
            service,
            config,
            root,
            warnings,
        })
    }

    /// The lineage service.
    pub fn service(&self) -> &LineageService {
        &self.service
    }

    /// Loaded configuration.
    pub fn config(&self) -> &TributaryConfig {
        &self.config
    }

    /// Directory containing `.tributary/`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the `.tributary` directory.
    pub fn tributary_dir(&self) -> PathBuf {
        self.root.join(TRIBUTARY_DIR_NAME)
    }

    /// Problems found while loading the snapshot.
    pub fn load_warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Path of the saved global layout.
    pub fn layout_path(&self) -> PathBuf {
        self.config.graph.layout_path(&self.root)
    }

    /// The saved global layout, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout file exists but is unreadable.
    pub async fn load_layout(&self) -> Result<Option<SavedLayout>> {
        layout_file::load_layout(&self.layout_path()).await
    }

    /// Replace the saved global layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save_layout(&self, layout: &SavedLayout) -> Result<()> {
        layout_file::save_layout(&self.layout_path(), layout).await
    }
}
