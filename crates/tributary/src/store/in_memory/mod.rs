//! In-memory graph store.
//!
//! Holds one [`GraphSnapshot`] behind a `tokio::sync::RwLock`. Reads share
//! the lock; [`GraphStore::import`] builds the new snapshot first and swaps
//! it in under the write lock, so readers never see a half-imported graph.
//!
//! # Persistence
//!
//! The store itself is ephemeral. [`load_from_jsonl`] fills one from the
//! three snapshot files and [`save_to_jsonl`] writes it back.
//!
//! # Performance Characteristics
//!
//! - `get_node_by_id`: O(1) through an ID index rebuilt on import
//! - `revision`: O(1)
//! - `get_all_*` and `snapshot`: O(n) clones
//! - `import`: O(n) for replace, O(n + m) for merge

mod inner;
mod jsonl;
mod trait_impl;

use crate::store::{GraphSnapshot, GraphStore};
use inner::InMemoryGraphInner;
use tokio::sync::RwLock;

pub use jsonl::{LoadWarning, SnapshotPaths, load_from_jsonl, load_snapshot, save_to_jsonl};

/// Thread-safe in-memory [`GraphStore`].
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    inner: RwLock<InMemoryGraphInner>,
}

impl InMemoryGraphStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `snapshot`.
    #[must_use]
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        Self {
            inner: RwLock::new(InMemoryGraphInner::new(snapshot)),
        }
    }
}

/// Create an empty in-memory store.
///
/// # Example
///
/// ```
/// use tributary::store::{GraphStore, new_in_memory_store};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let store = new_in_memory_store();
///     assert!(store.get_all_nodes().await.unwrap().is_empty());
/// }
/// ```
#[must_use]
pub fn new_in_memory_store() -> Box<dyn GraphStore> {
    Box::new(InMemoryGraphStore::new())
}
