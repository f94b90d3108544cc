//! Graph store abstraction.
//!
//! The engine reads nodes, edges and flows through [`GraphStore`] and never
//! mutates them, except through a bulk [`GraphStore::import`] that replaces
//! or merges a whole [`GraphSnapshot`].
//!
//! Implementations:
//!
//! - **In-memory**: a snapshot behind an async `RwLock`, loadable from and
//!   savable to JSONL files (see [`in_memory`])
//!
//! # Example
//!
//! ```no_run
//! use tributary::store::{GraphStore, GraphSnapshot, ImportMode, new_in_memory_store};
//! use tributary::domain::{Edge, Node, NodeType};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let store = new_in_memory_store();
//!     let snapshot = GraphSnapshot {
//!         nodes: vec![
//!             Node::new("raw_orders", "raw_orders", NodeType::Source),
//!             Node::new("stg_orders", "stg_orders", NodeType::Model),
//!         ],
//!         edges: vec![Edge::new("e1", "raw_orders", "stg_orders")],
//!         flows: vec![],
//!     };
//!     store.import(snapshot, ImportMode::Replace).await?;
//!     println!("{} nodes", store.get_all_nodes().await?.len());
//!     Ok(())
//! }
//! ```

use crate::domain::{Edge, Flow, Node, NodeId};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod in_memory;
pub mod layout_file;

pub use in_memory::{InMemoryGraphStore, LoadWarning, SnapshotPaths, new_in_memory_store};

/// Everything the engine needs from one read of the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// All nodes
    pub nodes: Vec<Node>,

    /// All edges, in ingestion order
    pub edges: Vec<Edge>,

    /// All flows
    pub flows: Vec<Flow>,
}

/// How [`GraphStore::import`] combines new records with existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Discard the current graph
    Replace,

    /// Upsert by ID, keeping records not mentioned in the import
    Merge,
}

/// Record counts after an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Nodes now stored
    pub nodes: usize,

    /// Edges now stored
    pub edges: usize,

    /// Flows now stored
    pub flows: usize,
}

/// Read access to a lineage graph plus bulk import.
///
/// Implementations must be `Send + Sync`; reads take `&self` so a store can
/// be shared by concurrent requests.
///
/// # Consistency
///
/// [`snapshot`](Self::snapshot) returns nodes, edges and flows from a single
/// consistent state. Callers that use the three `get_all_*` methods
/// separately may observe an import in between.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// All nodes.
    async fn get_all_nodes(&self) -> Result<Vec<Node>>;

    /// All edges, in ingestion order.
    async fn get_all_edges(&self) -> Result<Vec<Edge>>;

    /// All flows.
    async fn get_all_flows(&self) -> Result<Vec<Flow>>;

    /// A single node, or `None` if it does not exist.
    async fn get_node_by_id(&self, id: &NodeId) -> Result<Option<Node>>;

    /// Nodes, edges and flows read together.
    async fn snapshot(&self) -> Result<GraphSnapshot> {
        Ok(GraphSnapshot {
            nodes: self.get_all_nodes().await?,
            edges: self.get_all_edges().await?,
            flows: self.get_all_flows().await?,
        })
    }

    /// Counter bumped by every import.
    ///
    /// Two equal revisions read from the same store mean the graph did not
    /// change in between.
    async fn revision(&self) -> Result<u64>;

    /// Replace or merge the stored graph.
    async fn import(&self, snapshot: GraphSnapshot, mode: ImportMode) -> Result<ImportSummary>;
}
