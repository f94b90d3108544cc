//! Breadth-first traversal over a [`LineageGraph`].
//!
//! Every walk keeps an explicit visited set, so cyclic graphs terminate.
//! Depths are clamped to [`MAX_TRAVERSAL_DEPTH`].

use crate::domain::NodeId;
use crate::graph::LineageGraph;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// Maximum number of hops any lineage walk will take.
pub const MAX_TRAVERSAL_DEPTH: u32 = 10;

/// Clamp a caller-supplied depth into `0..=MAX_TRAVERSAL_DEPTH`.
///
/// ```
/// use tributary::traversal::clamp_depth;
///
/// assert_eq!(clamp_depth(-3), 0);
/// assert_eq!(clamp_depth(4), 4);
/// assert_eq!(clamp_depth(50), 10);
/// ```
#[must_use]
pub fn clamp_depth(depth: i64) -> u32 {
    u32::try_from(depth.clamp(0, i64::from(MAX_TRAVERSAL_DEPTH))).unwrap_or(0)
}

/// Which way along the edges a walk or path goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathDirection {
    /// Against edge direction, toward producers
    Upstream,

    /// Along edge direction, toward consumers
    Downstream,
}

impl PathDirection {
    /// Sign applied to hop counts when converting to relative layers.
    #[must_use]
    pub fn sign(self) -> i32 {
        match self {
            Self::Upstream => -1,
            Self::Downstream => 1,
        }
    }

    pub(crate) fn edge_direction(self) -> Direction {
        match self {
            Self::Upstream => Direction::Incoming,
            Self::Downstream => Direction::Outgoing,
        }
    }
}

/// Nodes reachable from `start` within `max_depth` hops, in discovery order.
///
/// Each entry carries its hop count. `start` itself is not included. When a
/// `universe` is given, nodes outside it are neither reported nor walked
/// through. An unknown `start` yields an empty list.
#[must_use]
pub fn walk(
    graph: &LineageGraph,
    start: &NodeId,
    direction: PathDirection,
    max_depth: u32,
    universe: Option<&HashSet<NodeId>>,
) -> Vec<(NodeId, u32)> {
    let max_depth = max_depth.min(MAX_TRAVERSAL_DEPTH);
    let Some(start_index) = graph.index_of(start) else {
        return Vec::new();
    };

    let mut discovered = Vec::new();
    let mut visited = HashSet::from([start_index]);
    let mut queue: VecDeque<(NodeIndex, u32)> = VecDeque::from([(start_index, 0)]);

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for next in graph.neighbors(current, direction.edge_direction()) {
            let id = graph.id_at(next);
            if universe.is_some_and(|allowed| !allowed.contains(id)) {
                continue;
            }
            if visited.insert(next) {
                discovered.push((id.clone(), depth + 1));
                queue.push_back((next, depth + 1));
            }
        }
    }

    tracing::trace!(
        start = %start,
        ?direction,
        max_depth,
        found = discovered.len(),
        "Traversal complete"
    );
    discovered
}

/// IDs of nodes upstream of `id` within `max_depth` hops.
#[must_use]
pub fn get_upstream(graph: &LineageGraph, id: &NodeId, max_depth: u32) -> HashSet<NodeId> {
    walk(graph, id, PathDirection::Upstream, max_depth, None)
        .into_iter()
        .map(|(node, _)| node)
        .collect()
}

/// IDs of nodes downstream of `id` within `max_depth` hops.
#[must_use]
pub fn get_downstream(graph: &LineageGraph, id: &NodeId, max_depth: u32) -> HashSet<NodeId> {
    walk(graph, id, PathDirection::Downstream, max_depth, None)
        .into_iter()
        .map(|(node, _)| node)
        .collect()
}

/// How two nodes are related, as found by [`find_path`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipPath {
    /// Where the search started
    pub from: NodeId,

    /// The node that was reached
    pub to: NodeId,

    /// Whether `to` is upstream or downstream of `from`
    pub direction: PathDirection,

    /// Number of edges on the path
    pub hops: u32,

    /// Nodes strictly between `from` and `to`, ordered from `from`
    pub intermediates: Vec<NodeId>,
}

/// Shortest directed path between two nodes.
///
/// Searches downstream from `from` first, then upstream. Among equally short
/// paths the one discovered first (by edge input order) wins. Returns `None`
/// if either node is unknown, the nodes are the same, or they are unrelated.
#[must_use]
pub fn find_path(graph: &LineageGraph, from: &NodeId, to: &NodeId) -> Option<RelationshipPath> {
    find_path_within(graph, from, to, None)
}

/// [`find_path`] restricted to `universe`.
///
/// Intermediate nodes must belong to the universe. The endpoints are taken as
/// given so callers can ask about an anchor that is not itself a member.
#[must_use]
pub fn find_path_within(
    graph: &LineageGraph,
    from: &NodeId,
    to: &NodeId,
    universe: Option<&HashSet<NodeId>>,
) -> Option<RelationshipPath> {
    if from == to {
        return None;
    }
    let start = graph.index_of(from)?;
    let target = graph.index_of(to)?;

    [PathDirection::Downstream, PathDirection::Upstream]
        .into_iter()
        .find_map(|direction| {
            let chain =
                shortest_chain(graph, start, target, direction.edge_direction(), universe)?;
            let hops = u32::try_from(chain.len() - 1).ok()?;
            let intermediates = chain[1..chain.len() - 1]
                .iter()
                .map(|&index| graph.id_at(index).clone())
                .collect();
            Some(RelationshipPath {
                from: from.clone(),
                to: to.clone(),
                direction,
                hops,
                intermediates,
            })
        })
}

/// BFS with a predecessor map; returns the node chain from `start` to `target`.
fn shortest_chain(
    graph: &LineageGraph,
    start: NodeIndex,
    target: NodeIndex,
    direction: Direction,
    universe: Option<&HashSet<NodeId>>,
) -> Option<Vec<NodeIndex>> {
    let mut predecessor: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        if current == target {
            let mut chain = vec![target];
            let mut cursor = target;
            while let Some(&previous) = predecessor.get(&cursor) {
                chain.push(previous);
                cursor = previous;
            }
            chain.reverse();
            return Some(chain);
        }
        for next in graph.neighbors(current, direction) {
            let outside = next != target
                && universe.is_some_and(|allowed| !allowed.contains(graph.id_at(next)));
            if outside {
                continue;
            }
            if visited.insert(next) {
                predecessor.insert(next, current);
                queue.push_back(next);
            }
        }
    }
    None
}
