//! Diff-based layout updates.
//!
//! When a graph changes a little, relaying out everything makes a familiar
//! picture jump around. [`compute_layout_with_diff`] keeps the previous
//! coordinates of surviving nodes, slots new nodes next to their neighbors,
//! and then pushes overlapping nodes apart. Large changes fall back to a full
//! [`precompute_layout`].

use super::LayoutConfig;
use super::topological::{LayoutBounds, compute_layers, precompute_layout};
use crate::domain::{Edge, Node, NodeId, Position};
use crate::graph::LineageGraph;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Relative edge-count change above which the topology counts as changed.
pub const EDGE_CHANGE_THRESHOLD: f64 = 0.10;

/// Largest share of added plus removed nodes the incremental path accepts.
pub const NODE_CHANGE_THRESHOLD: f64 = 0.20;

/// Weight of the layer column when blending a new node's x with its neighbors'.
const LAYER_X_WEIGHT: f64 = 0.8;

/// How the current graph differs from a previous layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayoutDiff {
    /// Nodes without a previous position, sorted by ID
    pub added: Vec<NodeId>,

    /// Previously positioned nodes that no longer exist, sorted by ID
    pub removed: Vec<NodeId>,

    /// Nodes present in both, sorted by ID
    pub unchanged: Vec<NodeId>,

    /// Edge count moved by more than [`EDGE_CHANGE_THRESHOLD`]
    pub topology_changed: bool,
}

/// Which layout path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStrategy {
    /// Every node was repositioned from scratch
    Full,

    /// Previous positions were patched
    Incremental,
}

/// Output of [`compute_layout_with_diff`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncrementalLayoutResult {
    /// Position of every current node
    pub positions: BTreeMap<NodeId, Position>,

    /// Node IDs per layer, top to bottom
    pub layers: BTreeMap<u32, Vec<NodeId>>,

    /// Overall extent
    pub bounds: LayoutBounds,

    /// The diff the decision was based on
    pub diff: LayoutDiff,

    /// Which path ran
    pub strategy: LayoutStrategy,
}

/// Classify nodes against a previous layout and check the edge-count drift.
#[must_use]
pub fn compute_layout_diff(
    nodes: &[Node],
    edges: &[Edge],
    previous: &BTreeMap<NodeId, Position>,
    previous_edge_count: usize,
) -> LayoutDiff {
    let current: BTreeSet<&NodeId> = nodes.iter().map(|node| &node.id).collect();

    let (unchanged, added): (Vec<&NodeId>, Vec<&NodeId>) =
        current.iter().copied().partition(|id| previous.contains_key(*id));
    let removed = previous
        .keys()
        .filter(|id| !current.contains(id))
        .cloned()
        .collect();

    LayoutDiff {
        added: added.into_iter().cloned().collect(),
        removed,
        unchanged: unchanged.into_iter().cloned().collect(),
        topology_changed: edge_count_changed(previous_edge_count, edges.len()),
    }
}

#[allow(clippy::cast_precision_loss)]
fn edge_count_changed(previous: usize, current: usize) -> bool {
    if previous == 0 {
        return current > 0;
    }
    previous.abs_diff(current) as f64 / previous as f64 > EDGE_CHANGE_THRESHOLD
}

/// Whether a diff is small enough to patch instead of relaying out.
///
/// Requires a stable edge count, at least one surviving node, and churn of at
/// most [`NODE_CHANGE_THRESHOLD`] of `total_nodes`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn should_use_incremental_layout(diff: &LayoutDiff, total_nodes: usize) -> bool {
    if diff.topology_changed || diff.unchanged.is_empty() || total_nodes == 0 {
        return false;
    }
    let churn = (diff.added.len() + diff.removed.len()) as f64 / total_nodes as f64;
    churn <= NODE_CHANGE_THRESHOLD
}

/// Lay out the graph, reusing `previous` positions when the change is small.
#[must_use]
pub fn compute_layout_with_diff(
    nodes: &[Node],
    edges: &[Edge],
    previous: &BTreeMap<NodeId, Position>,
    previous_edge_count: usize,
    config: &LayoutConfig,
) -> IncrementalLayoutResult {
    let diff = compute_layout_diff(nodes, edges, previous, previous_edge_count);
    let total_nodes = diff.added.len() + diff.unchanged.len();

    if !should_use_incremental_layout(&diff, total_nodes) {
        tracing::debug!(
            added = diff.added.len(),
            removed = diff.removed.len(),
            topology_changed = diff.topology_changed,
            "Running full layout"
        );
        let full = precompute_layout(nodes, edges, config);
        return IncrementalLayoutResult {
            positions: full.positions,
            layers: full.layers,
            bounds: full.bounds,
            diff,
            strategy: LayoutStrategy::Full,
        };
    }

    let graph = LineageGraph::new(nodes, edges);
    let layer_of = compute_layers(&graph);

    let mut positions: BTreeMap<NodeId, Position> = BTreeMap::new();
    for id in &diff.unchanged {
        let (Some(old), Some(&layer)) = (previous.get(id), layer_of.get(id)) else {
            continue;
        };
        positions.insert(
            id.clone(),
            Position {
                x: old.x,
                y: old.y,
                layer,
            },
        );
    }

    let mut names: HashMap<&NodeId, &str> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        names.entry(&node.id).or_insert(&node.name);
    }
    let mut pending: Vec<(u32, &str, &NodeId)> = diff
        .added
        .iter()
        .map(|id| {
            let layer = layer_of.get(id).copied().unwrap_or(0);
            (layer, names.get(id).copied().unwrap_or_default(), id)
        })
        .collect();
    pending.sort_unstable();

    for (layer, _, id) in pending {
        let position = place_new_node(&graph, &positions, id, layer, config);
        positions.insert(id.clone(), position);
    }

    let movable: HashSet<&NodeId> = diff.added.iter().collect();
    let sweeps = resolve_collisions(&mut positions, &movable, config);

    let layers = group_by_layer(&positions);
    let bounds = LayoutBounds::enclosing(positions.values(), config, layers.len());
    tracing::debug!(
        added = diff.added.len(),
        removed = diff.removed.len(),
        unchanged = diff.unchanged.len(),
        sweeps,
        "Patched layout incrementally"
    );

    IncrementalLayoutResult {
        positions,
        layers,
        bounds,
        diff,
        strategy: LayoutStrategy::Incremental,
    }
}

/// Blend toward placed neighbors, or append below the layer's lowest node.
#[allow(clippy::cast_precision_loss)]
fn place_new_node(
    graph: &LineageGraph,
    placed: &BTreeMap<NodeId, Position>,
    id: &NodeId,
    layer: u32,
    config: &LayoutConfig,
) -> Position {
    let layer_x = config.layer_x(layer);

    let anchors: Vec<&Position> = graph
        .index_of(id)
        .map(|index| {
            let mut adjacent = graph.neighbors(index, Direction::Incoming);
            adjacent.extend(graph.neighbors(index, Direction::Outgoing));
            adjacent
        })
        .unwrap_or_default()
        .into_iter()
        .filter_map(|index| placed.get(graph.id_at(index)))
        .collect();

    if anchors.is_empty() {
        let bottom = placed
            .values()
            .filter(|position| position.layer == layer)
            .map(|position| position.y)
            .fold(None, |lowest: Option<f64>, y| Some(lowest.map_or(y, |l| l.max(y))));
        return Position {
            x: layer_x,
            y: bottom.map_or(config.margin, |y| y + config.row_pitch()),
            layer,
        };
    }

    let count = anchors.len() as f64;
    let avg_x = anchors.iter().map(|p| p.x).sum::<f64>() / count;
    let avg_y = anchors.iter().map(|p| p.y).sum::<f64>() / count;
    Position {
        x: LAYER_X_WEIGHT * layer_x + (1.0 - LAYER_X_WEIGHT) * avg_x,
        y: avg_y,
        layer,
    }
}

/// Push same-layer nodes apart until no pair is closer than the clearance.
///
/// Only nodes in `movable` are moved. Returns the number of sweeps that moved
/// something.
fn resolve_collisions(
    positions: &mut BTreeMap<NodeId, Position>,
    movable: &HashSet<&NodeId>,
    config: &LayoutConfig,
) -> u32 {
    let clearance = config.node_height + config.collision_padding;

    for sweep in 0..config.max_collision_iterations {
        let mut by_layer: BTreeMap<u32, Vec<(&NodeId, &mut Position)>> = BTreeMap::new();
        for (id, position) in positions.iter_mut() {
            by_layer.entry(position.layer).or_default().push((id, position));
        }

        let mut moved = false;
        for members in by_layer.values_mut() {
            members.sort_by(|(id_a, a), (id_b, b)| a.y.total_cmp(&b.y).then_with(|| id_a.cmp(id_b)));
            for j in 1..members.len() {
                let (head, tail) = members.split_at_mut(j);
                let (lower_id, lower) = &mut tail[0];
                for (upper_id, upper) in head.iter_mut() {
                    let distance = lower.y - upper.y;
                    if distance >= clearance {
                        continue;
                    }
                    let overlap = clearance - distance;
                    match (movable.contains(*upper_id), movable.contains(*lower_id)) {
                        (true, true) => {
                            upper.y -= overlap / 2.0;
                            lower.y += overlap / 2.0;
                        }
                        (true, false) => upper.y -= overlap,
                        (false, true) => lower.y += overlap,
                        (false, false) => continue,
                    }
                    moved = true;
                }
            }
        }

        if !moved {
            return sweep;
        }
    }
    config.max_collision_iterations
}

fn group_by_layer(positions: &BTreeMap<NodeId, Position>) -> BTreeMap<u32, Vec<NodeId>> {
    let mut layers: BTreeMap<u32, Vec<(&NodeId, f64)>> = BTreeMap::new();
    for (id, position) in positions {
        layers.entry(position.layer).or_default().push((id, position.y));
    }
    layers
        .into_iter()
        .map(|(layer, mut members)| {
            members.sort_by(|(id_a, a), (id_b, b)| a.total_cmp(b).then_with(|| id_a.cmp(id_b)));
            (layer, members.into_iter().map(|(id, _)| id.clone()).collect())
        })
        .collect()
}
