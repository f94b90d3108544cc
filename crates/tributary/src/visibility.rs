//! Anchor-centric visibility.
//!
//! [`compute_visibility`] decides which nodes a lineage view shows, which
//! nodes appear as ghosts at its border, and where each sits relative to the
//! anchor:
//!
//! 1. Restrict the universe to the active flow's members (plus anchor and
//!    focus), or the whole graph.
//! 2. Walk upstream and downstream from the anchor. Each upstream hop is one
//!    layer to the left (−1), each downstream hop one to the right (+1).
//! 3. With a focus, walk again from the focus and merge. When both walks
//!    reach a node the layer closer to 0 wins; ties keep the anchor's.
//! 4. Optionally add unreached flow members.
//! 5. Ghosts are the non-visible neighbors of visible nodes.
//!
//! Layer 0 belongs to the anchor alone. Any other node whose computed layer
//! would be 0 is moved one step further in the direction it was reached.

use crate::domain::{Edge, Flow, LayerRange, Node, NodeId, VisibilityReason, VisibleNode};
use crate::graph::LineageGraph;
use crate::layout::compute_layers;
use crate::traversal::{PathDirection, find_path_within, walk};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// What the user asked to see.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisibilityState {
    /// Node the view is centered on
    pub anchor: NodeId,

    /// Second node whose neighborhood is stretched into the view
    pub focus: Option<NodeId>,

    /// Flow restricting the traversal universe
    pub flow: Option<String>,

    /// Hops to walk against edge direction
    pub upstream_depth: u32,

    /// Hops to walk along edge direction
    pub downstream_depth: u32,

    /// Also show flow members that traversal did not reach
    pub show_orphans: bool,
}

impl VisibilityState {
    /// View of `anchor` with the given depths and no focus or flow.
    pub fn new(anchor: impl Into<NodeId>, upstream_depth: u32, downstream_depth: u32) -> Self {
        Self {
            anchor: anchor.into(),
            focus: None,
            flow: None,
            upstream_depth,
            downstream_depth,
            show_orphans: false,
        }
    }

    /// Set the focus node.
    #[must_use]
    pub fn with_focus(mut self, focus: impl Into<NodeId>) -> Self {
        self.focus = Some(focus.into());
        self
    }

    /// Restrict traversal to a flow.
    #[must_use]
    pub fn with_flow(mut self, flow: impl Into<String>) -> Self {
        self.flow = Some(flow.into());
        self
    }

    /// Include unreached flow members.
    #[must_use]
    pub fn with_orphans(mut self, show_orphans: bool) -> Self {
        self.show_orphans = show_orphans;
        self
    }
}

/// Output of [`compute_visibility`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisibilityResult {
    /// The anchor, or `None` if it does not exist
    pub anchor_node: Option<Node>,

    /// Nodes in the view, ordered by layer, name, ID
    pub visible_nodes: Vec<VisibleNode>,

    /// Border nodes one edge outside the view, same ordering
    pub ghost_nodes: Vec<VisibleNode>,

    /// Edges between visible and ghost nodes, in input order
    pub visible_edges: Vec<Edge>,

    /// Layer span of `visible_nodes`
    pub layer_range: LayerRange,
}

impl VisibilityResult {
    /// Result for a missing anchor.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// IDs of visible nodes.
    pub fn visible_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.visible_nodes.iter().map(|visible| &visible.node.id)
    }

    /// IDs of ghost nodes.
    pub fn ghost_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.ghost_nodes.iter().map(|ghost| &ghost.node.id)
    }
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    layer: i32,
    reason: VisibilityReason,
}

/// Layer assignments with closest-to-anchor reconciliation.
#[derive(Debug, Default)]
struct Layering {
    placements: HashMap<NodeId, Placement>,
}

impl Layering {
    fn offer(&mut self, id: &NodeId, layer: i32, reason: VisibilityReason) {
        match self.placements.get_mut(id) {
            Some(existing) if layer.abs() < existing.layer.abs() => {
                *existing = Placement { layer, reason };
            }
            Some(_) => {}
            None => {
                self.placements.insert(id.clone(), Placement { layer, reason });
            }
        }
    }

    fn contains(&self, id: &NodeId) -> bool {
        self.placements.contains_key(id)
    }

    fn layer_of(&self, id: &NodeId) -> Option<i32> {
        self.placements.get(id).map(|placement| placement.layer)
    }
}

/// Moves a non-anchor 0 one step in the direction of travel.
fn off_anchor(layer: i32, direction: PathDirection) -> i32 {
    if layer == 0 { direction.sign() } else { layer }
}

fn hops_to_layer(hops: u32) -> i32 {
    i32::try_from(hops).unwrap_or(i32::MAX)
}

/// Compute the visible nodes, ghosts and edges for one view.
///
/// Never fails: a missing anchor gives [`VisibilityResult::empty`], an
/// unknown flow or focus is ignored, and dangling edges are skipped.
#[must_use]
pub fn compute_visibility(
    state: &VisibilityState,
    nodes: &[Node],
    edges: &[Edge],
    flows: &[Flow],
) -> VisibilityResult {
    let graph = LineageGraph::new(nodes, edges);
    let mut node_by_id: HashMap<&NodeId, &Node> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        node_by_id.entry(&node.id).or_insert(node);
    }

    let Some(anchor_node) = node_by_id.get(&state.anchor).copied() else {
        tracing::debug!(anchor = %state.anchor, "Anchor not found");
        return VisibilityResult::empty();
    };
    let anchor = &anchor_node.id;

    let focus = state.focus.as_ref().filter(|focus| {
        if graph.contains(focus) {
            true
        } else {
            tracing::warn!(focus = %focus, "Ignoring unknown focus node");
            false
        }
    });

    let flow = state.flow.as_ref().and_then(|flow_id| {
        let found = flows.iter().find(|flow| &flow.id == flow_id);
        if found.is_none() {
            tracing::warn!(flow = %flow_id, "Ignoring unknown flow");
        }
        found
    });
    let universe: Option<HashSet<NodeId>> = flow.map(|flow| {
        flow.member_nodes
            .iter()
            .chain(std::iter::once(anchor))
            .chain(focus)
            .cloned()
            .collect()
    });

    let mut layering = Layering::default();
    layering.offer(anchor, 0, VisibilityReason::Anchor);
    stretch(
        &mut layering,
        &graph,
        anchor,
        anchor,
        0,
        state,
        universe.as_ref(),
        false,
    );

    // Topological layers are only needed when something has no path to the anchor.
    let mut topo_layers: Option<HashMap<NodeId, u32>> = None;
    let mut topo_delta = |id: &NodeId| -> i32 {
        let layers = topo_layers.get_or_insert_with(|| compute_layers(&graph));
        let of = |id: &NodeId| i64::from(layers.get(id).copied().unwrap_or(0));
        i32::try_from(of(id) - of(anchor)).unwrap_or(0)
    };

    if let Some(focus) = focus.filter(|focus| *focus != anchor) {
        // A focus already reached by the anchor walk keeps that layer.
        let focus_layer = match layering.layer_of(focus) {
            Some(layer) => layer,
            None => match find_path_within(&graph, anchor, focus, universe.as_ref()) {
                Some(path) => path.direction.sign() * hops_to_layer(path.hops),
                None => off_anchor(topo_delta(focus), PathDirection::Downstream),
            },
        };
        layering.offer(focus, focus_layer, VisibilityReason::FocusStretch);
        stretch(
            &mut layering,
            &graph,
            anchor,
            focus,
            focus_layer,
            state,
            universe.as_ref(),
            true,
        );
    }

    if state.show_orphans {
        if let Some(flow) = flow {
            for member in &flow.member_nodes {
                if !graph.contains(member) || layering.contains(member) {
                    continue;
                }
                let layer = off_anchor(topo_delta(member), PathDirection::Downstream);
                layering.offer(member, layer, VisibilityReason::FlowMember);
            }
        }
    }

    let visible_nodes = to_visible_nodes(&layering, &node_by_id);
    let ghosts = find_ghosts(&graph, &layering, &visible_nodes, universe.as_ref());
    let ghost_nodes = to_visible_nodes(&ghosts, &node_by_id);

    let shown: HashSet<&NodeId> = visible_nodes
        .iter()
        .chain(&ghost_nodes)
        .map(|visible| &visible.node.id)
        .collect();
    let visible_edges = edges
        .iter()
        .filter(|edge| shown.contains(&edge.from) && shown.contains(&edge.to))
        .cloned()
        .collect();

    let layer_range = LayerRange::from_layers(visible_nodes.iter().map(|v| v.relative_layer))
        .unwrap_or_default();

    tracing::debug!(
        anchor = %anchor,
        visible = visible_nodes.len(),
        ghosts = ghost_nodes.len(),
        min_layer = layer_range.min,
        max_layer = layer_range.max,
        "Computed visibility"
    );

    VisibilityResult {
        anchor_node: Some(anchor_node.clone()),
        visible_nodes,
        ghost_nodes,
        visible_edges,
        layer_range,
    }
}

/// Walk both directions from `origin`, placing nodes relative to `origin_layer`.
#[allow(clippy::too_many_arguments)]
fn stretch(
    layering: &mut Layering,
    graph: &LineageGraph,
    anchor: &NodeId,
    origin: &NodeId,
    origin_layer: i32,
    state: &VisibilityState,
    universe: Option<&HashSet<NodeId>>,
    via_focus: bool,
) {
    for (direction, depth) in [
        (PathDirection::Upstream, state.upstream_depth),
        (PathDirection::Downstream, state.downstream_depth),
    ] {
        let reason = match (via_focus, direction) {
            (true, _) => VisibilityReason::FocusStretch,
            (false, PathDirection::Upstream) => VisibilityReason::Upstream,
            (false, PathDirection::Downstream) => VisibilityReason::Downstream,
        };
        for (id, hops) in walk(graph, origin, direction, depth, universe) {
            if &id == anchor {
                continue;
            }
            let layer = off_anchor(
                origin_layer + direction.sign() * hops_to_layer(hops),
                direction,
            );
            layering.offer(&id, layer, reason);
        }
    }
}

/// Neighbors of visible nodes that are not visible themselves.
///
/// With a flow active, neighbors inside the flow are left out: they are
/// members the view chose not to reach, not border nodes.
fn find_ghosts(
    graph: &LineageGraph,
    visible: &Layering,
    ordered: &[VisibleNode],
    universe: Option<&HashSet<NodeId>>,
) -> Layering {
    let mut ghosts = Layering::default();
    for shown in ordered {
        let Some(index) = graph.index_of(&shown.node.id) else {
            continue;
        };
        for (edge_direction, direction) in [
            (Direction::Incoming, PathDirection::Upstream),
            (Direction::Outgoing, PathDirection::Downstream),
        ] {
            for neighbor in graph.neighbors(index, edge_direction) {
                let id = graph.id_at(neighbor);
                if visible.contains(id) || universe.is_some_and(|members| members.contains(id)) {
                    continue;
                }
                let layer = off_anchor(shown.relative_layer + direction.sign(), direction);
                ghosts.offer(id, layer, VisibilityReason::AdjacentButExcluded);
            }
        }
    }
    ghosts
}

fn to_visible_nodes(layering: &Layering, node_by_id: &HashMap<&NodeId, &Node>) -> Vec<VisibleNode> {
    let mut visible: Vec<VisibleNode> = layering
        .placements
        .iter()
        .filter_map(|(id, placement)| {
            node_by_id.get(id).map(|node| VisibleNode {
                node: (*node).clone(),
                visibility_reason: placement.reason,
                relative_layer: placement.layer,
            })
        })
        .collect();
    visible.sort_by(|a, b| {
        a.relative_layer
            .cmp(&b.relative_layer)
            .then_with(|| a.node.name.cmp(&b.node.name))
            .then_with(|| a.node.id.cmp(&b.node.id))
    });
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeType;

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> (Vec<Node>, Vec<Edge>) {
        let nodes = ids
            .iter()
            .map(|id| Node::new(*id, *id, NodeType::Model))
            .collect();
        let edges = edges
            .iter()
            .enumerate()
            .map(|(i, (from, to))| Edge::new(format!("e{i}"), *from, *to))
            .collect();
        (nodes, edges)
    }

    fn layers(result: &VisibilityResult) -> Vec<(&str, i32)> {
        result
            .visible_nodes
            .iter()
            .map(|v| (v.node.id.as_str(), v.relative_layer))
            .collect()
    }

    fn flow(id: &str, members: &[&str]) -> Flow {
        Flow {
            id: id.to_string(),
            name: id.to_string(),
            anchor_nodes: Vec::new(),
            member_nodes: members.iter().map(|m| NodeId::from(*m)).collect(),
            user_defined: true,
            inference_reason: None,
        }
    }

    #[test]
    fn chain_around_anchor() {
        let (nodes, edges) = graph(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d")]);
        let state = VisibilityState::new("c", 2, 1);
        let result = compute_visibility(&state, &nodes, &edges, &[]);

        assert_eq!(layers(&result), vec![("a", -2), ("b", -1), ("c", 0), ("d", 1)]);
        assert_eq!(result.layer_range, LayerRange { min: -2, max: 1 });
        assert!(result.ghost_nodes.is_empty());
        assert_eq!(result.visible_edges.len(), 3);
    }

    #[test]
    fn zero_depth_shows_anchor_and_ghost_border() {
        let (nodes, edges) = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        let result = compute_visibility(&VisibilityState::new("b", 0, 0), &nodes, &edges, &[]);

        assert_eq!(layers(&result), vec![("b", 0)]);
        let ghosts: Vec<(&str, i32)> = result
            .ghost_nodes
            .iter()
            .map(|g| (g.node.id.as_str(), g.relative_layer))
            .collect();
        assert_eq!(ghosts, vec![("a", -1), ("c", 1)]);
        assert_eq!(result.visible_edges.len(), 2);
    }

    #[test]
    fn missing_anchor_is_empty() {
        let (nodes, edges) = graph(&["a"], &[]);
        let result = compute_visibility(&VisibilityState::new("nope", 2, 2), &nodes, &edges, &[]);
        assert!(result.anchor_node.is_none());
        assert!(result.visible_nodes.is_empty());
        assert_eq!(result.layer_range, LayerRange::default());
    }

    #[test]
    fn cycle_keeps_upstream_layer_on_tie() {
        let (nodes, edges) = graph(&["a", "b"], &[("a", "b"), ("b", "a")]);
        let result = compute_visibility(&VisibilityState::new("a", 1, 1), &nodes, &edges, &[]);
        let b = &result.visible_nodes[0];
        assert_eq!(b.node.id.as_str(), "b");
        assert_eq!(b.relative_layer, -1);
        assert_eq!(b.visibility_reason, VisibilityReason::Upstream);
    }

    #[test]
    fn flow_limits_universe_and_ghosts() {
        // x -> y -> z is the flow; w feeds y from outside it.
        let (nodes, edges) = graph(
            &["w", "x", "y", "z"],
            &[("x", "y"), ("y", "z"), ("w", "y")],
        );
        let flows = vec![flow("orders", &["x", "y", "z"])];
        let state = VisibilityState::new("y", 3, 3).with_flow("orders");
        let result = compute_visibility(&state, &nodes, &edges, &flows);

        let visible: HashSet<&str> = result.visible_ids().map(NodeId::as_str).collect();
        assert_eq!(visible, HashSet::from(["x", "y", "z"]));
        let ghosts: Vec<&str> = result.ghost_ids().map(NodeId::as_str).collect();
        assert_eq!(ghosts, vec!["w"]);
    }

    #[test]
    fn unknown_flow_is_ignored() {
        let (nodes, edges) = graph(&["a", "b"], &[("a", "b")]);
        let state = VisibilityState::new("a", 1, 1).with_flow("missing");
        let result = compute_visibility(&state, &nodes, &edges, &[]);
        assert_eq!(layers(&result), vec![("a", 0), ("b", 1)]);
    }

    #[test]
    fn focus_stretches_view_beyond_anchor_depth() {
        // a -> b -> c -> d -> e, anchor a (down 1), focus d (up 0, down 1).
        let (nodes, edges) = graph(
            &["a", "b", "c", "d", "e"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e")],
        );
        let state = VisibilityState::new("a", 0, 1).with_focus("d");
        let result = compute_visibility(&state, &nodes, &edges, &[]);

        assert_eq!(layers(&result), vec![("a", 0), ("b", 1), ("d", 3), ("e", 4)]);
        let e = result.visible_nodes.iter().find(|v| v.node.id.as_str() == "e").unwrap();
        assert_eq!(e.visibility_reason, VisibilityReason::FocusStretch);
    }

    #[test]
    fn focus_overlap_keeps_layer_closest_to_anchor() {
        // a -> b -> c and a -> c; focus b walks to c at +2 but a reaches it at +1.
        let (nodes, edges) = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("a", "c")]);
        let state = VisibilityState::new("a", 0, 1).with_focus("b");
        let result = compute_visibility(&state, &nodes, &edges, &[]);

        let c = result.visible_nodes.iter().find(|v| v.node.id.as_str() == "c").unwrap();
        assert_eq!(c.relative_layer, 1);
        assert_eq!(c.visibility_reason, VisibilityReason::Downstream);
    }

    fn flow_with_shortcut() -> (Vec<Node>, Vec<Edge>, Vec<Flow>) {
        // a -> z -> f skips the flow; a -> x -> y -> f stays inside it.
        let (nodes, edges) = graph(
            &["a", "x", "y", "z", "f"],
            &[("a", "x"), ("x", "y"), ("y", "f"), ("a", "z"), ("z", "f")],
        );
        (nodes, edges, vec![flow("flow", &["x", "y", "f"])])
    }

    #[test]
    fn focus_reached_by_anchor_walk_keeps_its_layer() {
        let (nodes, edges, flows) = flow_with_shortcut();
        let plain = VisibilityState::new("a", 0, 3).with_flow("flow");
        let focused = plain.clone().with_focus("f");

        let without = compute_visibility(&plain, &nodes, &edges, &flows);
        let with = compute_visibility(&focused, &nodes, &edges, &flows);

        let expected = vec![("a", 0), ("x", 1), ("y", 2), ("f", 3)];
        assert_eq!(layers(&without), expected);
        assert_eq!(layers(&with), expected);
    }

    #[test]
    fn focus_path_stays_inside_flow() {
        let (nodes, edges, flows) = flow_with_shortcut();
        let state = VisibilityState::new("a", 0, 1).with_flow("flow").with_focus("f");
        let result = compute_visibility(&state, &nodes, &edges, &flows);

        assert_eq!(layers(&result), vec![("a", 0), ("x", 1), ("f", 3)]);
    }

    #[test]
    fn focus_on_cycle_stretches_from_its_walked_layer() {
        // a -> b -> c -> a: c is one hop upstream of a and two hops downstream.
        let (nodes, edges) = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let state = VisibilityState::new("a", 1, 0).with_focus("c");
        let result = compute_visibility(&state, &nodes, &edges, &[]);

        assert_eq!(layers(&result), vec![("b", -2), ("c", -1), ("a", 0)]);
    }

    #[test]
    fn unrelated_focus_uses_topological_layers_off_zero() {
        // Two separate chains; anchor and focus are both sources (layer 0).
        let (nodes, edges) = graph(&["a", "b", "f", "g"], &[("a", "b"), ("f", "g")]);
        let state = VisibilityState::new("a", 0, 0).with_focus("f");
        let result = compute_visibility(&state, &nodes, &edges, &[]);

        let f = result.visible_nodes.iter().find(|v| v.node.id.as_str() == "f").unwrap();
        assert_eq!(f.relative_layer, 1);
        assert!(result.visible_nodes.iter().filter(|v| v.relative_layer == 0).count() == 1);
    }

    #[test]
    fn orphans_join_as_flow_members() {
        let (nodes, edges) = graph(&["a", "b", "lonely"], &[("a", "b")]);
        let flows = vec![flow("f", &["a", "b", "lonely"])];
        let state = VisibilityState::new("a", 1, 1)
            .with_flow("f")
            .with_orphans(true);
        let result = compute_visibility(&state, &nodes, &edges, &flows);

        let lonely = result
            .visible_nodes
            .iter()
            .find(|v| v.node.id.as_str() == "lonely")
            .unwrap();
        assert_eq!(lonely.visibility_reason, VisibilityReason::FlowMember);
        assert_ne!(lonely.relative_layer, 0);
    }
}
