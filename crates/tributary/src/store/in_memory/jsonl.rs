//! JSONL persistence for the in-memory store.
//!
//! A graph snapshot is three JSON Lines files: nodes, edges and flows. A
//! missing file reads as empty. Bad lines and integrity problems are
//! reported as [`LoadWarning`]s and never abort the load.

use super::InMemoryGraphStore;
use crate::domain::{Edge, Flow, Node, NodeId};
use crate::error::{Error, Result, StorageError};
use crate::store::{GraphSnapshot, GraphStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tributary_jsonl::{Warning as JsonlWarning, read_jsonl_resilient, write_jsonl_atomic};

/// Locations of the three snapshot files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPaths {
    /// Nodes file
    pub nodes: PathBuf,

    /// Edges file
    pub edges: PathBuf,

    /// Flows file
    pub flows: PathBuf,
}

impl SnapshotPaths {
    /// `nodes.jsonl`, `edges.jsonl` and `flows.jsonl` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            nodes: dir.join("nodes.jsonl"),
            edges: dir.join("edges.jsonl"),
            flows: dir.join("flows.jsonl"),
        }
    }
}

/// Non-fatal problems found while loading a snapshot.
///
/// The store still loads; the warning says what was skipped or kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A line was not a readable record
    ///
    /// **Effect**: The line is skipped.
    /// **Common causes**: Truncated exports, manual edits, schema drift.
    MalformedJson {
        /// File the line came from
        file: PathBuf,
        /// 1-based line number
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// A node ID appeared more than once
    ///
    /// **Effect**: The first occurrence wins; later ones are dropped.
    /// **Common causes**: Concatenated exports from overlapping ingestion runs.
    DuplicateNode {
        /// The repeated ID
        id: NodeId,
    },

    /// An edge references a node that does not exist
    ///
    /// **Effect**: The edge is kept in the snapshot but ignored by traversal
    /// and layout.
    /// **Common causes**: Partial ingestion, nodes filtered out upstream.
    DanglingEdge {
        /// Edge ID
        edge_id: String,
        /// Producing node
        from: NodeId,
        /// Consuming node
        to: NodeId,
    },

    /// A flow lists a member that does not exist
    ///
    /// **Effect**: The member is kept but can never become visible.
    /// **Common causes**: Stale user-defined flows after a model was removed.
    UnknownFlowMember {
        /// Flow ID
        flow_id: String,
        /// Missing member
        node_id: NodeId,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson {
                file,
                line_number,
                error,
            } => write!(f, "{}:{line_number}: skipped unreadable line: {error}", file.display()),
            Self::DuplicateNode { id } => write!(f, "duplicate node '{id}' ignored"),
            Self::DanglingEdge { edge_id, from, to } => {
                write!(f, "edge '{edge_id}' ({from} -> {to}) references a missing node")
            }
            Self::UnknownFlowMember { flow_id, node_id } => {
                write!(f, "flow '{flow_id}' lists unknown member '{node_id}'")
            }
        }
    }
}

async fn read_records<T: DeserializeOwned>(
    path: &Path,
    warnings: &mut Vec<LoadWarning>,
) -> Result<Vec<T>> {
    if !tokio::fs::try_exists(path).await? {
        tracing::debug!(path = %path.display(), "Snapshot file missing, treating as empty");
        return Ok(Vec::new());
    }

    let (records, jsonl_warnings) = read_jsonl_resilient::<T, _>(path)
        .await
        .map_err(|e| match e {
            tributary_jsonl::Error::Io(io) => Error::Io(io),
            tributary_jsonl::Error::Json(json) => Error::Json(json),
            tributary_jsonl::Error::InvalidFormat(reason) => StorageError::InvalidFormat {
                path: path.to_path_buf(),
                reason,
            }
            .into(),
        })?;

    warnings.extend(jsonl_warnings.into_iter().map(|warning| {
        let (line_number, error) = match warning {
            JsonlWarning::MalformedJson { line_number, error } => (line_number, error),
            JsonlWarning::SkippedLine {
                line_number,
                reason,
            } => (line_number, reason),
        };
        LoadWarning::MalformedJson {
            file: path.to_path_buf(),
            line_number,
            error,
        }
    }));
    Ok(records)
}

/// Read a snapshot from disk, collecting warnings.
///
/// # Errors
///
/// Fails only when a file exists but cannot be read, or is not UTF-8.
pub async fn load_snapshot(paths: &SnapshotPaths) -> Result<(GraphSnapshot, Vec<LoadWarning>)> {
    let mut warnings = Vec::new();

    let raw_nodes: Vec<Node> = read_records(&paths.nodes, &mut warnings).await?;
    let edges: Vec<Edge> = read_records(&paths.edges, &mut warnings).await?;
    let flows: Vec<Flow> = read_records(&paths.flows, &mut warnings).await?;

    let mut seen: HashSet<NodeId> = HashSet::with_capacity(raw_nodes.len());
    let mut nodes = Vec::with_capacity(raw_nodes.len());
    for node in raw_nodes {
        if seen.insert(node.id.clone()) {
            nodes.push(node);
        } else {
            warnings.push(LoadWarning::DuplicateNode { id: node.id });
        }
    }

    for edge in &edges {
        if !seen.contains(&edge.from) || !seen.contains(&edge.to) {
            warnings.push(LoadWarning::DanglingEdge {
                edge_id: edge.id.clone(),
                from: edge.from.clone(),
                to: edge.to.clone(),
            });
        }
    }

    for flow in &flows {
        for member in flow.member_nodes.iter().filter(|member| !seen.contains(*member)) {
            warnings.push(LoadWarning::UnknownFlowMember {
                flow_id: flow.id.clone(),
                node_id: member.clone(),
            });
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "Loaded graph snapshot with warnings");
    }
    tracing::debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        flows = flows.len(),
        "Loaded graph snapshot"
    );

    Ok((GraphSnapshot { nodes, edges, flows }, warnings))
}

/// Load an in-memory store from snapshot files.
///
/// # Errors
///
/// See [`load_snapshot`].
///
/// # Example
///
/// ```no_run
/// use tributary::store::{SnapshotPaths, in_memory::load_from_jsonl};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let (store, warnings) = load_from_jsonl(&SnapshotPaths::in_dir(".tributary")).await?;
/// for warning in &warnings {
///     eprintln!("warning: {warning}");
/// }
/// # let _ = store;
/// # Ok(())
/// # }
/// ```
pub async fn load_from_jsonl(
    paths: &SnapshotPaths,
) -> Result<(Box<dyn GraphStore>, Vec<LoadWarning>)> {
    let (snapshot, warnings) = load_snapshot(paths).await?;
    Ok((Box::new(InMemoryGraphStore::from_snapshot(snapshot)), warnings))
}

async fn write_file<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    write_jsonl_atomic(path, records)
        .await
        .map_err(|source| StorageError::Serialization {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(())
}

/// Write a store's current snapshot to disk.
///
/// Each file is replaced atomically.
///
/// # Errors
///
/// Returns [`StorageError::Serialization`] naming the file that failed.
pub async fn save_to_jsonl(store: &dyn GraphStore, paths: &SnapshotPaths) -> Result<()> {
    let snapshot = store.snapshot().await?;

    write_file(&paths.nodes, &snapshot.nodes).await?;
    write_file(&paths.edges, &snapshot.edges).await?;
    write_file(&paths.flows, &snapshot.flows).await?;

    tracing::debug!(nodes = snapshot.nodes.len(), "Saved graph snapshot");
    Ok(())
}
