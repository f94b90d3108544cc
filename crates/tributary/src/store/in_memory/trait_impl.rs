//! `GraphStore` implementation for the in-memory store.

use super::InMemoryGraphStore;
use crate::domain::{Edge, Flow, Node, NodeId};
use crate::error::Result;
use crate::store::{GraphSnapshot, GraphStore, ImportMode, ImportSummary};
use async_trait::async_trait;

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn get_all_nodes(&self) -> Result<Vec<Node>> {
        Ok(self.inner.read().await.snapshot.nodes.clone())
    }

    async fn get_all_edges(&self) -> Result<Vec<Edge>> {
        Ok(self.inner.read().await.snapshot.edges.clone())
    }

    async fn get_all_flows(&self) -> Result<Vec<Flow>> {
        Ok(self.inner.read().await.snapshot.flows.clone())
    }

    async fn get_node_by_id(&self, id: &NodeId) -> Result<Option<Node>> {
        Ok(self.inner.read().await.node(id).cloned())
    }

    async fn snapshot(&self) -> Result<GraphSnapshot> {
        Ok(self.inner.read().await.snapshot.clone())
    }

    async fn revision(&self) -> Result<u64> {
        Ok(self.inner.read().await.revision)
    }

    async fn import(&self, snapshot: GraphSnapshot, mode: ImportMode) -> Result<ImportSummary> {
        let mut inner = self.inner.write().await;
        let next = inner.imported(snapshot, mode);
        *inner = next;
        let summary = inner.summary();
        tracing::debug!(
            ?mode,
            revision = inner.revision,
            nodes = summary.nodes,
            edges = summary.edges,
            flows = summary.flows,
            "Imported graph"
        );
        Ok(summary)
    }
}
