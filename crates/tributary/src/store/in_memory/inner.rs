//! Snapshot plus ID index.

use crate::domain::{Node, NodeId};
use crate::store::{GraphSnapshot, ImportMode, ImportSummary};
use std::collections::HashMap;
use std::hash::Hash;

/// Inner store state (not thread-safe).
#[derive(Debug, Default)]
pub(super) struct InMemoryGraphInner {
    pub(super) snapshot: GraphSnapshot,

    /// Position of each node in `snapshot.nodes`. First occurrence wins.
    node_index: HashMap<NodeId, usize>,

    /// Number of imports applied since the store was created.
    pub(super) revision: u64,
}

impl InMemoryGraphInner {
    pub(super) fn new(snapshot: GraphSnapshot) -> Self {
        let node_index = index_nodes(&snapshot.nodes);
        Self {
            snapshot,
            node_index,
            revision: 0,
        }
    }

    pub(super) fn node(&self, id: &NodeId) -> Option<&Node> {
        self.node_index
            .get(id)
            .and_then(|&position| self.snapshot.nodes.get(position))
    }

    pub(super) fn summary(&self) -> ImportSummary {
        ImportSummary {
            nodes: self.snapshot.nodes.len(),
            edges: self.snapshot.edges.len(),
            flows: self.snapshot.flows.len(),
        }
    }

    /// Build the post-import state without touching `self`.
    pub(super) fn imported(&self, incoming: GraphSnapshot, mode: ImportMode) -> Self {
        let snapshot = match mode {
            ImportMode::Replace => incoming,
            ImportMode::Merge => {
                let current = &self.snapshot;
                GraphSnapshot {
                    nodes: upsert(&current.nodes, incoming.nodes, |node| node.id.clone()),
                    edges: upsert(&current.edges, incoming.edges, |edge| edge.id.clone()),
                    flows: upsert(&current.flows, incoming.flows, |flow| flow.id.clone()),
                }
            }
        };
        Self {
            revision: self.revision.wrapping_add(1),
            ..Self::new(snapshot)
        }
    }
}

fn index_nodes(nodes: &[Node]) -> HashMap<NodeId, usize> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (position, node) in nodes.iter().enumerate() {
        index.entry(node.id.clone()).or_insert(position);
    }
    index
}

/// Replace records with matching keys in place; append the rest in order.
fn upsert<T, K>(existing: &[T], incoming: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T>
where
    T: Clone,
    K: Eq + Hash,
{
    let mut merged = existing.to_vec();
    let mut positions: HashMap<K, usize> = HashMap::with_capacity(merged.len());
    for (position, record) in merged.iter().enumerate() {
        positions.entry(key(record)).or_insert(position);
    }
    for record in incoming {
        match positions.get(&key(&record)) {
            Some(&position) => merged[position] = record,
            None => {
                positions.insert(key(&record), merged.len());
                merged.push(record);
            }
        }
    }
    merged
}
