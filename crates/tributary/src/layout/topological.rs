//! Global longest-path layering.
//!
//! Sources get layer 0 and every other node sits one layer right of its
//! deepest producer. Within a layer nodes are stacked alphabetically.

use super::LayoutConfig;
use crate::domain::{Edge, Node, NodeId, Position};
use crate::graph::LineageGraph;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Extent of a computed layout.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutBounds {
    /// Right edge of the rightmost node plus margin
    pub width: f64,

    /// Bottom edge of the lowest node plus margin
    pub height: f64,

    /// Number of distinct layers
    pub layer_count: usize,
}

impl LayoutBounds {
    /// Bounds enclosing every position.
    #[must_use]
    pub fn enclosing<'a>(
        positions: impl IntoIterator<Item = &'a Position>,
        config: &LayoutConfig,
        layer_count: usize,
    ) -> Self {
        let mut bounds: Option<(f64, f64)> = None;
        for position in positions {
            let (x, y) = bounds.unwrap_or((position.x, position.y));
            bounds = Some((x.max(position.x), y.max(position.y)));
        }
        match bounds {
            Some((max_x, max_y)) => Self {
                width: max_x + config.node_width + config.margin,
                height: max_y + config.node_height + config.margin,
                layer_count,
            },
            None => Self::default(),
        }
    }
}

/// Positions for every node in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologicalLayout {
    /// Position of every node
    pub positions: BTreeMap<NodeId, Position>,

    /// Node IDs per layer, top to bottom
    pub layers: BTreeMap<u32, Vec<NodeId>>,

    /// Overall extent
    pub bounds: LayoutBounds,
}

/// Longest-path layer of every node in the graph.
///
/// Layers are relaxed breadth-first from the sources and only ever increase.
/// A layer never exceeds `n - 1`, which bounds the pass on cyclic input.
/// Nodes not reachable from any source stay on layer 0.
#[must_use]
pub fn compute_layers(graph: &LineageGraph) -> HashMap<NodeId, u32> {
    let cap = u32::try_from(graph.node_count().saturating_sub(1)).unwrap_or(u32::MAX);
    let mut layers: HashMap<NodeIndex, u32> = graph.indices().map(|index| (index, 0)).collect();
    let mut queue: VecDeque<NodeIndex> = graph
        .indices()
        .filter(|&index| graph.in_degree(index) == 0)
        .collect();

    while let Some(current) = queue.pop_front() {
        let Some(&layer) = layers.get(&current) else {
            continue;
        };
        let candidate = layer + 1;
        if candidate > cap {
            continue;
        }
        for next in graph.neighbors(current, Direction::Outgoing) {
            let entry = layers.entry(next).or_insert(0);
            if candidate > *entry {
                *entry = candidate;
                queue.push_back(next);
            }
        }
    }

    layers
        .into_iter()
        .map(|(index, layer)| (graph.id_at(index).clone(), layer))
        .collect()
}

/// Assign every node a global layer and a deterministic x/y position.
///
/// Edges with unknown endpoints are ignored.
#[must_use]
pub fn precompute_layout(nodes: &[Node], edges: &[Edge], config: &LayoutConfig) -> TopologicalLayout {
    let graph = LineageGraph::new(nodes, edges);
    let layer_of = compute_layers(&graph);

    let mut names: HashMap<&NodeId, &str> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        names.entry(&node.id).or_insert(&node.name);
    }

    let mut layers: BTreeMap<u32, Vec<NodeId>> = BTreeMap::new();
    for (id, &layer) in &layer_of {
        layers.entry(layer).or_default().push(id.clone());
    }

    let mut positions = BTreeMap::new();
    for (&layer, members) in &mut layers {
        members.sort_by(|a, b| {
            let name_a = names.get(a).copied().unwrap_or_default();
            let name_b = names.get(b).copied().unwrap_or_default();
            name_a.cmp(name_b).then_with(|| a.cmp(b))
        });
        for (row, id) in members.iter().enumerate() {
            positions.insert(
                id.clone(),
                Position {
                    x: config.layer_x(layer),
                    y: config.margin + row_offset(row, config),
                    layer,
                },
            );
        }
    }

    let bounds = LayoutBounds::enclosing(positions.values(), config, layers.len());
    tracing::debug!(
        nodes = positions.len(),
        layers = layers.len(),
        "Computed topological layout"
    );

    TopologicalLayout {
        positions,
        layers,
        bounds,
    }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn row_offset(row: usize, config: &LayoutConfig) -> f64 {
    row as f64 * config.row_pitch()
}
