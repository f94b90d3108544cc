//! Lineage service: store, visibility, local layout and cache wired together.
//!
//! Every call first reads the store's [revision](GraphStore::revision). When
//! it differs from the one the cache was filled against, the cache is cleared
//! before lookup, so views never outlive the graph they were computed from
//! even if the store was changed behind the service's back. Only a cache miss
//! reads the full [`GraphSnapshot`].
//!
//! # Example
//!
//! ```no_run
//! use tributary::service::{LineageQuery, LineageService};
//! use tributary::store::new_in_memory_store;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let service = LineageService::new(new_in_memory_store(), 1000);
//! let query = LineageQuery::new("fct_orders", 2, 1);
//! if let Some(response) = service.lineage(&query).await? {
//!     println!("{} nodes (cached: {})", response.view.nodes.len(), response.cache_hit);
//! }
//! # Ok(())
//! # }
//! ```

use crate::cache::{CacheKeyParams, CacheStats, LineageCache, generate_cache_key};
use crate::domain::{Edge, LayerRange, Node, NodeId, VisibleNode};
use crate::error::{Error, Result};
use crate::graph::LineageGraph;
use crate::layer_naming::{LayerNamer, PrefixLayerNamer, name_layers};
use crate::layout::{
    IncrementalLayoutResult, LayoutConfig, SavedLayout, compute_layout_with_diff,
    compute_local_layout,
};
use crate::store::{GraphSnapshot, GraphStore, ImportMode, ImportSummary};
use crate::traversal::{RelationshipPath, clamp_depth, find_path};
use crate::visibility::{VisibilityState, compute_visibility};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A lineage request as received from a caller.
///
/// Depths are signed so out-of-range input can be clamped rather than
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageQuery {
    /// Node to center on
    pub anchor: NodeId,

    /// Requested upstream depth, clamped to `0..=10`
    pub upstream_depth: i64,

    /// Requested downstream depth, clamped to `0..=10`
    pub downstream_depth: i64,

    /// Flow restricting the view
    #[serde(default)]
    pub flow: Option<String>,

    /// Focus node stretched into the view
    #[serde(default)]
    pub focus: Option<NodeId>,

    /// Include unreached flow members
    #[serde(default)]
    pub show_orphans: bool,
}

impl LineageQuery {
    /// Query for `anchor` with no flow or focus.
    pub fn new(anchor: impl Into<NodeId>, upstream_depth: i64, downstream_depth: i64) -> Self {
        Self {
            anchor: anchor.into(),
            upstream_depth,
            downstream_depth,
            flow: None,
            focus: None,
            show_orphans: false,
        }
    }

    /// Set the flow filter.
    #[must_use]
    pub fn with_flow(mut self, flow: Option<String>) -> Self {
        self.flow = flow;
        self
    }

    /// Set the focus node.
    #[must_use]
    pub fn with_focus(mut self, focus: Option<NodeId>) -> Self {
        self.focus = focus;
        self
    }

    /// Include unreached flow members.
    #[must_use]
    pub fn with_orphans(mut self, show_orphans: bool) -> Self {
        self.show_orphans = show_orphans;
        self
    }

    /// The clamped visibility state this query asks for.
    #[must_use]
    pub fn to_state(&self) -> VisibilityState {
        VisibilityState {
            anchor: self.anchor.clone(),
            focus: self.focus.clone(),
            flow: self.flow.clone(),
            upstream_depth: clamp_depth(self.upstream_depth),
            downstream_depth: clamp_depth(self.downstream_depth),
            show_orphans: self.show_orphans,
        }
    }
}

/// A visible or ghost node with its view coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedNode {
    /// The node, why it is shown and its relative layer
    #[serde(flatten)]
    pub visible: VisibleNode,

    /// View x
    pub x: f64,

    /// View y
    pub y: f64,
}

/// Summary counts for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewStats {
    /// Visible nodes, anchor included
    pub visible_nodes: usize,

    /// Ghost nodes
    pub ghost_nodes: usize,

    /// Edges drawn
    pub edges: usize,

    /// Visible nodes left of the anchor
    pub upstream_nodes: usize,

    /// Visible nodes right of the anchor
    pub downstream_nodes: usize,

    /// Populated relative layers
    pub layers: usize,
}

/// Everything a client needs to draw one lineage view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageView {
    /// The anchor node
    pub anchor: Node,

    /// Visible nodes, ordered by layer, name, ID
    pub nodes: Vec<PositionedNode>,

    /// Ghost nodes, same ordering
    pub ghost_nodes: Vec<PositionedNode>,

    /// Edges between shown nodes
    pub edges: Vec<Edge>,

    /// Layer span of the visible nodes
    pub layer_range: LayerRange,

    /// Label per populated layer
    pub layer_names: BTreeMap<i32, String>,

    /// Summary counts
    pub stats: ViewStats,
}

/// A view plus whether it came from the cache.
#[derive(Debug, Clone)]
pub struct LineageResponse {
    /// The view, shared with the cache
    pub view: Arc<LineageView>,

    /// `true` if no computation ran
    pub cache_hit: bool,
}

#[derive(Debug)]
struct CacheState {
    views: LineageCache<LineageView>,
    /// Store revision the cached views were computed from.
    revision: Option<u64>,
}

impl CacheState {
    fn sync_revision(&mut self, revision: u64) {
        if self.revision == Some(revision) {
            return;
        }
        if let Some(previous) = self.revision {
            tracing::debug!(previous, revision, "Graph changed, clearing lineage cache");
        }
        self.views.clear();
        self.revision = Some(revision);
    }
}

/// Entry point for lineage queries against a [`GraphStore`].
pub struct LineageService {
    store: Box<dyn GraphStore>,
    cache: Mutex<CacheState>,
    layout: LayoutConfig,
    namer: Box<dyn LayerNamer>,
}

impl std::fmt::Debug for LineageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineageService")
            .field("store", &"<dyn GraphStore>")
            .field("layout", &self.layout)
            .field("namer", &"<dyn LayerNamer>")
            .finish_non_exhaustive()
    }
}

impl LineageService {
    /// Create a service over `store` caching up to `cache_capacity` views.
    ///
    /// Uses the default [`LayoutConfig`] and [`PrefixLayerNamer`].
    #[must_use]
    pub fn new(store: Box<dyn GraphStore>, cache_capacity: usize) -> Self {
        Self {
            store,
            cache: Mutex::new(CacheState {
                views: LineageCache::new(cache_capacity),
                revision: None,
            }),
            layout: LayoutConfig::default(),
            namer: Box::new(PrefixLayerNamer),
        }
    }

    /// Replace the layout spacing.
    #[must_use]
    pub fn with_layout_config(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Replace the layer naming strategy.
    #[must_use]
    pub fn with_layer_namer(mut self, namer: Box<dyn LayerNamer>) -> Self {
        self.namer = namer;
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }

    /// Layout spacing in use.
    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Compute or fetch the view for `query`.
    ///
    /// Returns `Ok(None)` when the anchor does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store cannot be read.
    pub async fn lineage(&self, query: &LineageQuery) -> Result<Option<LineageResponse>> {
        let revision = self.store.revision().await?;
        let state = query.to_state();
        let params = CacheKeyParams::from(&state);
        let key = generate_cache_key(&params);

        {
            let mut cache = self.cache.lock().await;
            cache.sync_revision(revision);
            if let Some(view) = cache.views.get(&key, &params) {
                tracing::debug!(key = %key, anchor = %state.anchor, "Lineage cache hit");
                return Ok(Some(LineageResponse {
                    view,
                    cache_hit: true,
                }));
            }
        }
        tracing::debug!(key = %key, anchor = %state.anchor, "Lineage cache miss");

        let snapshot = self.store.snapshot().await?;
        let Some(view) = self.build_view(&state, &snapshot) else {
            return Ok(None);
        };

        // The graph may have changed since the revision was read; such a view
        // is returned but not cached.
        let current = self.store.revision().await?;
        let mut cache = self.cache.lock().await;
        if current != revision || cache.revision != Some(revision) {
            return Ok(Some(LineageResponse {
                view: Arc::new(view),
                cache_hit: false,
            }));
        }
        let view = cache.views.set(key, params, view);
        Ok(Some(LineageResponse {
            view,
            cache_hit: false,
        }))
    }

    fn build_view(&self, state: &VisibilityState, snapshot: &GraphSnapshot) -> Option<LineageView> {
        let result = compute_visibility(state, &snapshot.nodes, &snapshot.edges, &snapshot.flows);
        let anchor = result.anchor_node?;

        // Ghosts share the pass so they line up with the visible layers.
        let range = result
            .ghost_nodes
            .iter()
            .fold(result.layer_range, |range, ghost| {
                range.including(ghost.relative_layer)
            });
        let everything: Vec<VisibleNode> = result
            .visible_nodes
            .iter()
            .chain(&result.ghost_nodes)
            .cloned()
            .collect();
        let positions = compute_local_layout(&everything, range, &self.layout);

        let place = |visible: VisibleNode| {
            let (x, y) = positions
                .get(&visible.node.id)
                .map_or((0.0, 0.0), |position| (position.x, position.y));
            PositionedNode { visible, x, y }
        };

        let layer_names = name_layers(self.namer.as_ref(), &result.visible_nodes);
        let stats = ViewStats {
            visible_nodes: result.visible_nodes.len(),
            ghost_nodes: result.ghost_nodes.len(),
            edges: result.visible_edges.len(),
            upstream_nodes: result
                .visible_nodes
                .iter()
                .filter(|visible| visible.relative_layer < 0)
                .count(),
            downstream_nodes: result
                .visible_nodes
                .iter()
                .filter(|visible| visible.relative_layer > 0)
                .count(),
            layers: layer_names.len(),
        };

        Some(LineageView {
            anchor,
            nodes: result.visible_nodes.into_iter().map(&place).collect(),
            ghost_nodes: result.ghost_nodes.into_iter().map(&place).collect(),
            edges: result.visible_edges,
            layer_range: result.layer_range,
            layer_names,
            stats,
        })
    }

    /// Explain how `from` and `to` are related.
    ///
    /// Returns `Ok(None)` when both exist but neither reaches the other.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] if either node does not exist.
    pub async fn explain_path(&self, from: &NodeId, to: &NodeId) -> Result<Option<RelationshipPath>> {
        let snapshot = self.store.snapshot().await?;
        let graph = LineageGraph::new(&snapshot.nodes, &snapshot.edges);
        for id in [from, to] {
            if !graph.contains(id) {
                return Err(Error::NodeNotFound(id.clone()));
            }
        }
        Ok(find_path(&graph, from, to))
    }

    /// Lay out the whole graph.
    ///
    /// With a `previous` layout and `full == false`, small changes are
    /// patched incrementally; otherwise every node is placed from scratch.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store cannot be read.
    pub async fn global_layout(
        &self,
        previous: Option<&SavedLayout>,
        full: bool,
    ) -> Result<IncrementalLayoutResult> {
        let snapshot = self.store.snapshot().await?;
        let empty = BTreeMap::new();
        let (positions, edge_count) = match previous {
            Some(saved) if !full => (&saved.positions, saved.edge_count),
            _ => (&empty, 0),
        };
        let result = compute_layout_with_diff(
            &snapshot.nodes,
            &snapshot.edges,
            positions,
            edge_count,
            &self.layout,
        );
        tracing::debug!(
            strategy = ?result.strategy,
            nodes = result.positions.len(),
            "Computed global layout"
        );
        Ok(result)
    }

    /// Import a snapshot into the store and drop every cached view.
    ///
    /// # Errors
    ///
    /// Propagates store errors; the cache is left untouched on failure.
    pub async fn import(&self, snapshot: GraphSnapshot, mode: ImportMode) -> Result<ImportSummary> {
        let summary = self.store.import(snapshot, mode).await?;
        let mut cache = self.cache.lock().await;
        cache.views.clear();
        cache.revision = None;
        tracing::info!(
            nodes = summary.nodes,
            edges = summary.edges,
            flows = summary.flows,
            "Imported graph"
        );
        Ok(summary)
    }

    /// Drop cached views anchored on or focused on `id`.
    pub async fn invalidate_anchor(&self, id: &NodeId) -> usize {
        let removed = self.cache.lock().await.views.invalidate_anchor(id);
        tracing::debug!(anchor = %id, removed, "Invalidated cached views");
        removed
    }

    /// Drop every cached view.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.views.clear();
    }

    /// Cache counters.
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.lock().await.views.stats()
    }

    /// Number of cached views.
    pub async fn cached_views(&self) -> usize {
        self.cache.lock().await.views.len()
    }
}
