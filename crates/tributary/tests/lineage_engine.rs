//! End-to-end checks of the lineage engine through the public library API.

use rstest::rstest;
use std::collections::{BTreeMap, HashSet};
use tributary::cache::{CacheKeyParams, LineageCache, generate_cache_key};
use tributary::domain::{NodeId, NodeType, VisibilityReason};
use tributary::layout::{
    LayoutConfig, LayoutStrategy, compute_layout_with_diff, precompute_layout,
};
use tributary::visibility::{VisibilityState, compute_visibility};

mod common;
use common::{edges, flow, nodes, shop};

fn layers_of(result: &tributary::visibility::VisibilityResult) -> Vec<(&str, i32)> {
    result
        .visible_nodes
        .iter()
        .map(|visible| (visible.node.id.as_str(), visible.relative_layer))
        .collect()
}

fn chain() -> (Vec<tributary::domain::Node>, Vec<tributary::domain::Edge>) {
    (
        nodes(&[
            ("A", NodeType::Source),
            ("B", NodeType::Model),
            ("C", NodeType::Model),
            ("D", NodeType::Table),
        ]),
        edges(&[("A", "B"), ("B", "C"), ("C", "D")]),
    )
}

// ============================================================================
// Visibility
// ============================================================================

#[test]
fn chain_anchor_two_up_one_down() {
    let (nodes, edges) = chain();
    let result = compute_visibility(&VisibilityState::new("C", 2, 1), &nodes, &edges, &[]);

    assert_eq!(layers_of(&result), vec![("A", -2), ("B", -1), ("C", 0), ("D", 1)]);
    assert_eq!(result.visible_nodes[2].visibility_reason, VisibilityReason::Anchor);
    assert_eq!(result.visible_nodes[0].visibility_reason, VisibilityReason::Upstream);
    assert_eq!(result.visible_nodes[3].visibility_reason, VisibilityReason::Downstream);
    assert!(result.ghost_nodes.is_empty());
    assert_eq!(result.visible_edges.len(), 3);
}

#[test]
fn chain_depth_one_leaves_ghost_at_border() {
    let (nodes, edges) = chain();
    let result = compute_visibility(&VisibilityState::new("C", 1, 1), &nodes, &edges, &[]);

    assert_eq!(layers_of(&result), vec![("B", -1), ("C", 0), ("D", 1)]);
    let ghosts: Vec<(&str, i32)> = result
        .ghost_nodes
        .iter()
        .map(|ghost| (ghost.node.id.as_str(), ghost.relative_layer))
        .collect();
    assert_eq!(ghosts, vec![("A", -2)]);
    assert_eq!(
        result.ghost_nodes[0].visibility_reason,
        VisibilityReason::AdjacentButExcluded
    );
}

#[rstest]
#[case("raw_orders")]
#[case("fct_orders")]
#[case("rpt_revenue")]
fn zero_depth_is_anchor_only(#[case] anchor: &str) {
    let snapshot = shop();
    let result = compute_visibility(
        &VisibilityState::new(anchor, 0, 0),
        &snapshot.nodes,
        &snapshot.edges,
        &snapshot.flows,
    );

    assert_eq!(layers_of(&result), vec![(anchor, 0)]);
}

#[test]
fn flow_bounds_the_traversal_universe() {
    // Z is outside the flow; P and Q are reachable from Z but not members.
    let nodes = nodes(&[
        ("X", NodeType::Source),
        ("Y", NodeType::Model),
        ("Z", NodeType::Model),
        ("P", NodeType::Source),
        ("Q", NodeType::Table),
    ]);
    let edges = edges(&[("X", "Y"), ("Y", "Z"), ("P", "Z"), ("Z", "Q")]);
    let flows = vec![flow("F", &["X", "Y"])];

    let state = VisibilityState::new("Z", 5, 5).with_flow("F");
    let result = compute_visibility(&state, &nodes, &edges, &flows);

    let visible: HashSet<&str> = result.visible_ids().map(NodeId::as_str).collect();
    assert_eq!(visible, HashSet::from(["X", "Y", "Z"]));
    let ghosts: HashSet<&str> = result.ghost_ids().map(NodeId::as_str).collect();
    assert_eq!(ghosts, HashSet::from(["P", "Q"]));
}

#[test]
fn unknown_anchor_gives_empty_result() {
    let snapshot = shop();
    let result = compute_visibility(
        &VisibilityState::new("missing", 3, 3),
        &snapshot.nodes,
        &snapshot.edges,
        &snapshot.flows,
    );

    assert!(result.anchor_node.is_none());
    assert!(result.visible_nodes.is_empty());
    assert!(result.ghost_nodes.is_empty());
}

#[test]
fn focus_stretches_the_view() {
    let snapshot = shop();
    let state = VisibilityState::new("stg_orders", 0, 0).with_focus("fct_orders");
    let result = compute_visibility(&state, &snapshot.nodes, &snapshot.edges, &snapshot.flows);

    let focus = result
        .visible_nodes
        .iter()
        .find(|visible| visible.node.id.as_str() == "fct_orders")
        .expect("focus should be visible");
    assert_eq!(focus.relative_layer, 2);
    assert_eq!(focus.visibility_reason, VisibilityReason::FocusStretch);
    assert_eq!(
        result
            .visible_nodes
            .iter()
            .filter(|visible| visible.relative_layer == 0)
            .count(),
        1
    );
}

#[test]
fn dangling_edges_are_skipped() {
    let (nodes, mut edges) = chain();
    edges.extend(common::edges(&[("C", "ghost_table"), ("nowhere", "A")]));
    let result = compute_visibility(&VisibilityState::new("C", 3, 3), &nodes, &edges, &[]);

    assert_eq!(result.visible_nodes.len(), 4);
    assert!(
        result
            .visible_edges
            .iter()
            .all(|edge| edge.from.as_str() != "nowhere" && edge.to.as_str() != "ghost_table")
    );
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn topological_layers_follow_longest_path() {
    let snapshot = shop();
    let layout = precompute_layout(&snapshot.nodes, &snapshot.edges, &LayoutConfig::default());

    let layer = |id: &str| layout.positions[&NodeId::from(id)].layer;
    assert_eq!(layer("raw_orders"), 0);
    assert_eq!(layer("raw_customers"), 0);
    assert_eq!(layer("stg_orders"), 1);
    assert_eq!(layer("stg_customers"), 1);
    assert_eq!(layer("int_order_items"), 2);
    assert_eq!(layer("dim_customers"), 2);
    assert_eq!(layer("fct_orders"), 3);
    assert_eq!(layer("rpt_revenue"), 4);
    assert_eq!(layout.bounds.layer_count, 5);
}

#[test]
fn precompute_is_deterministic() {
    let snapshot = shop();
    let config = LayoutConfig::default();
    let first = precompute_layout(&snapshot.nodes, &snapshot.edges, &config);

    let mut reversed_nodes = snapshot.nodes.clone();
    reversed_nodes.reverse();
    let second = precompute_layout(&reversed_nodes, &snapshot.edges, &config);

    assert_eq!(first.positions, second.positions);
}

#[test]
fn incremental_layout_keeps_unchanged_positions() {
    let mut snapshot = shop();
    let config = LayoutConfig::default();
    let before = precompute_layout(&snapshot.nodes, &snapshot.edges, &config);

    // One new node, one edge rewired: the edge count stays at eight.
    snapshot.nodes.extend(nodes(&[("rpt_churn", NodeType::Model)]));
    let rewired = snapshot.edges.last_mut().expect("shop has edges");
    rewired.to = NodeId::from("rpt_churn");

    let result = compute_layout_with_diff(
        &snapshot.nodes,
        &snapshot.edges,
        &before.positions,
        8,
        &config,
    );

    assert_eq!(result.strategy, LayoutStrategy::Incremental);
    assert_eq!(result.diff.added, vec![NodeId::from("rpt_churn")]);
    for (id, old) in &before.positions {
        let new = result.positions[id];
        assert_eq!((new.x, new.y), (old.x, old.y), "{id} moved");
    }
    assert_eq!(result.positions[&NodeId::from("rpt_churn")].layer, 3);
}

#[test]
fn large_change_falls_back_to_full_layout() {
    let snapshot = shop();
    let config = LayoutConfig::default();
    let before = precompute_layout(&snapshot.nodes[..4], &[], &config);

    let result = compute_layout_with_diff(
        &snapshot.nodes,
        &snapshot.edges,
        &before.positions,
        0,
        &config,
    );

    assert_eq!(result.strategy, LayoutStrategy::Full);
    assert_eq!(result.positions.len(), 8);
}

#[test]
fn no_previous_positions_means_full_layout() {
    let snapshot = shop();
    let result = compute_layout_with_diff(
        &snapshot.nodes,
        &snapshot.edges,
        &BTreeMap::new(),
        0,
        &LayoutConfig::default(),
    );

    assert_eq!(result.strategy, LayoutStrategy::Full);
    assert_eq!(result.diff.added.len(), 8);
}

// ============================================================================
// Cache
// ============================================================================

fn params(anchor: &str) -> CacheKeyParams {
    CacheKeyParams {
        anchor_id: NodeId::from(anchor),
        upstream_depth: 2,
        downstream_depth: 2,
        flow_id: None,
        focus_id: None,
        show_orphans: false,
    }
}

#[test]
fn cache_evicts_least_recently_used() {
    let mut cache: LineageCache<String> = LineageCache::new(5);
    let anchors = ["a", "b", "c", "d", "e"];
    for anchor in anchors {
        let p = params(anchor);
        cache.set(generate_cache_key(&p), p, anchor.to_uppercase());
    }

    // Touch the oldest entry so "b" becomes the least recent.
    let a = params("a");
    assert_eq!(cache.get(&generate_cache_key(&a), &a).as_deref(), Some(&"A".to_string()));

    let f = params("f");
    cache.set(generate_cache_key(&f), f, "F".to_string());

    assert_eq!(cache.len(), 5);
    let b = params("b");
    assert!(cache.get(&generate_cache_key(&b), &b).is_none());
    assert!(cache.get(&generate_cache_key(&a), &a).is_some());
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn cache_key_distinguishes_query_parameters() {
    let base = params("fct_orders");
    let mut deeper = base.clone();
    deeper.upstream_depth = 3;
    let mut flowed = base.clone();
    flowed.flow_id = Some("orders".to_string());
    let mut orphans = flowed.clone();
    orphans.show_orphans = true;

    let keys: HashSet<String> = [&base, &deeper, &flowed, &orphans]
        .into_iter()
        .map(generate_cache_key)
        .collect();
    assert_eq!(keys.len(), 4);
}
