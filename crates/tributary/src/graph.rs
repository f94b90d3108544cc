//! Indexed lineage graph built from node and edge lists.
//!
//! Edges point from producer to consumer, so `Direction::Outgoing` walks
//! downstream and `Direction::Incoming` walks upstream. Each edge carries its
//! position in the input slice; neighbor lists are returned in that order so
//! breadth-first searches discover nodes deterministically.

use crate::domain::{Edge, Node, NodeId};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// A directed graph over node IDs with O(1) ID lookup.
#[derive(Debug, Clone, Default)]
pub struct LineageGraph {
    /// Node weights are IDs; edge weights are input positions.
    graph: DiGraph<NodeId, usize>,

    /// Every node in `graph` has exactly one entry here.
    node_map: HashMap<NodeId, NodeIndex>,

    skipped_edges: usize,
}

impl LineageGraph {
    /// Build a graph, skipping edges whose endpoints are not in `nodes`.
    ///
    /// When the same ID appears twice, the first occurrence wins.
    #[must_use]
    pub fn new(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut node_map = HashMap::with_capacity(nodes.len());

        for node in nodes {
            node_map
                .entry(node.id.clone())
                .or_insert_with(|| graph.add_node(node.id.clone()));
        }

        let mut skipped_edges = 0;
        for (position, edge) in edges.iter().enumerate() {
            let (Some(&from), Some(&to)) = (node_map.get(&edge.from), node_map.get(&edge.to))
            else {
                tracing::debug!(
                    edge = %edge.id,
                    from = %edge.from,
                    to = %edge.to,
                    "Skipping edge with unknown endpoint"
                );
                skipped_edges += 1;
                continue;
            };
            graph.add_edge(from, to, position);
        }

        Self {
            graph,
            node_map,
            skipped_edges,
        }
    }

    /// Graph index for a node ID.
    #[must_use]
    pub fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// Node ID at a graph index.
    ///
    /// # Panics
    ///
    /// Panics if `index` did not come from this graph.
    #[must_use]
    pub fn id_at(&self, index: NodeIndex) -> &NodeId {
        &self.graph[index]
    }

    /// Whether the graph contains a node with this ID.
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Number of distinct nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges whose endpoints both exist.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of input edges dropped because an endpoint was missing.
    #[must_use]
    pub fn skipped_edges(&self) -> usize {
        self.skipped_edges
    }

    /// Iterate over every node index.
    pub fn indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Adjacent nodes in one direction, ordered by edge input position.
    ///
    /// Parallel edges yield the same neighbor more than once.
    #[must_use]
    pub fn neighbors(&self, index: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let mut adjacent: Vec<(usize, NodeIndex)> = self
            .graph
            .edges_directed(index, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (*edge.weight(), other)
            })
            .collect();
        adjacent.sort_unstable_by_key(|(position, _)| *position);
        adjacent.into_iter().map(|(_, other)| other).collect()
    }

    /// Number of incoming edges.
    #[must_use]
    pub fn in_degree(&self, index: NodeIndex) -> usize {
        self.graph
            .edges_directed(index, Direction::Incoming)
            .count()
    }
}
