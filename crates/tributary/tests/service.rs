//! Lineage service behavior: caching, invalidation and global layout.

use async_trait::async_trait;
use rstest::{fixture, rstest};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tributary::domain::{Edge, Flow, Node, NodeId, NodeType};
use tributary::error::Result;
use tributary::layout::{LayoutStrategy, SavedLayout};
use tributary::layer_naming::PlainLayerNamer;
use tributary::service::{LineageQuery, LineageService};
use tributary::store::{GraphSnapshot, GraphStore, ImportMode, ImportSummary, InMemoryGraphStore};

mod common;
use common::{nodes, shop};

#[fixture]
fn service() -> LineageService {
    LineageService::new(Box::new(InMemoryGraphStore::from_snapshot(shop())), 16)
}

fn extra_node(id: &str) -> GraphSnapshot {
    GraphSnapshot {
        nodes: nodes(&[(id, NodeType::Seed)]),
        edges: vec![],
        flows: vec![],
    }
}

/// In-memory store that counts full snapshot reads.
struct CountingStore {
    inner: InMemoryGraphStore,
    snapshots: Arc<AtomicUsize>,
}

#[async_trait]
impl GraphStore for CountingStore {
    async fn get_all_nodes(&self) -> Result<Vec<Node>> {
        self.inner.get_all_nodes().await
    }

    async fn get_all_edges(&self) -> Result<Vec<Edge>> {
        self.inner.get_all_edges().await
    }

    async fn get_all_flows(&self) -> Result<Vec<Flow>> {
        self.inner.get_all_flows().await
    }

    async fn get_node_by_id(&self, id: &NodeId) -> Result<Option<Node>> {
        self.inner.get_node_by_id(id).await
    }

    async fn snapshot(&self) -> Result<GraphSnapshot> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        self.inner.snapshot().await
    }

    async fn revision(&self) -> Result<u64> {
        self.inner.revision().await
    }

    async fn import(&self, snapshot: GraphSnapshot, mode: ImportMode) -> Result<ImportSummary> {
        self.inner.import(snapshot, mode).await
    }
}

#[rstest]
#[tokio::test]
async fn second_identical_query_hits_the_cache(service: LineageService) {
    let query = LineageQuery::new("fct_orders", 2, 1);

    let first = service.lineage(&query).await.unwrap().unwrap();
    let second = service.lineage(&query).await.unwrap().unwrap();

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert!(Arc::ptr_eq(&first.view, &second.view));
    let stats = service.cache_stats().await;
    assert_eq!((stats.hits, stats.misses), (1, 1));
}

#[tokio::test]
async fn cache_hits_skip_reading_the_graph() {
    let snapshots = Arc::new(AtomicUsize::new(0));
    let store = CountingStore {
        inner: InMemoryGraphStore::from_snapshot(shop()),
        snapshots: Arc::clone(&snapshots),
    };
    let service = LineageService::new(Box::new(store), 16);
    let query = LineageQuery::new("fct_orders", 2, 1);

    service.lineage(&query).await.unwrap().unwrap();
    for _ in 0..3 {
        assert!(service.lineage(&query).await.unwrap().unwrap().cache_hit);
    }
    assert_eq!(snapshots.load(Ordering::SeqCst), 1);

    service
        .store()
        .import(extra_node("seed_regions"), ImportMode::Merge)
        .await
        .unwrap();
    let after = service.lineage(&query).await.unwrap().unwrap();

    assert!(!after.cache_hit);
    assert_eq!(snapshots.load(Ordering::SeqCst), 2);
}

#[rstest]
#[tokio::test]
async fn clamped_depths_share_a_cache_entry(service: LineageService) {
    let huge = service
        .lineage(&LineageQuery::new("stg_orders", 500, -3))
        .await
        .unwrap()
        .unwrap();
    let clamped = service
        .lineage(&LineageQuery::new("stg_orders", 10, 0))
        .await
        .unwrap()
        .unwrap();

    assert!(!huge.cache_hit);
    assert!(clamped.cache_hit);
    assert_eq!(huge.view.layer_range.max, 0);
}

#[rstest]
#[tokio::test]
async fn missing_anchor_is_none_and_not_cached(service: LineageService) {
    let response = service
        .lineage(&LineageQuery::new("nope", 2, 2))
        .await
        .unwrap();

    assert!(response.is_none());
    assert_eq!(service.cached_views().await, 0);
}

#[rstest]
#[tokio::test]
async fn import_clears_cached_views(service: LineageService) {
    let query = LineageQuery::new("fct_orders", 2, 2);
    service.lineage(&query).await.unwrap();
    assert_eq!(service.cached_views().await, 1);

    service
        .import(extra_node("seed_regions"), ImportMode::Merge)
        .await
        .unwrap();

    assert_eq!(service.cached_views().await, 0);
    let after = service.lineage(&query).await.unwrap().unwrap();
    assert!(!after.cache_hit);
}

#[rstest]
#[tokio::test]
async fn store_changes_behind_the_service_invalidate_views(service: LineageService) {
    let query = LineageQuery::new("rpt_revenue", 1, 0);
    let before = service.lineage(&query).await.unwrap().unwrap();
    assert_eq!(before.view.stats.visible_nodes, 3);

    let mut renamed = nodes(&[("fct_orders", NodeType::Table)]);
    renamed[0].name = "orders_fact".to_string();
    service
        .store()
        .import(
            GraphSnapshot {
                nodes: renamed,
                edges: vec![],
                flows: vec![],
            },
            ImportMode::Merge,
        )
        .await
        .unwrap();

    let after = service.lineage(&query).await.unwrap().unwrap();
    assert!(!after.cache_hit);
    assert!(
        after
            .view
            .nodes
            .iter()
            .any(|node| node.visible.node.name == "orders_fact")
    );
}

#[rstest]
#[tokio::test]
async fn invalidate_anchor_drops_only_matching_views(service: LineageService) {
    service
        .lineage(&LineageQuery::new("fct_orders", 1, 1))
        .await
        .unwrap();
    service
        .lineage(&LineageQuery::new("fct_orders", 2, 2))
        .await
        .unwrap();
    service
        .lineage(
            &LineageQuery::new("stg_orders", 1, 1).with_focus(Some(NodeId::from("fct_orders"))),
        )
        .await
        .unwrap();
    service
        .lineage(&LineageQuery::new("dim_customers", 1, 1))
        .await
        .unwrap();

    let removed = service.invalidate_anchor(&NodeId::from("fct_orders")).await;

    assert_eq!(removed, 3);
    assert_eq!(service.cached_views().await, 1);
}

#[rstest]
#[tokio::test]
async fn explain_path_distinguishes_missing_and_unrelated(service: LineageService) {
    let path = service
        .explain_path(&NodeId::from("stg_customers"), &NodeId::from("rpt_revenue"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(path.hops, 2);

    let unrelated = service
        .explain_path(&NodeId::from("raw_orders"), &NodeId::from("raw_customers"))
        .await
        .unwrap();
    assert!(unrelated.is_none());

    let missing = service
        .explain_path(&NodeId::from("raw_orders"), &NodeId::from("nope"))
        .await;
    assert!(missing.is_err());
}

#[rstest]
#[tokio::test]
async fn global_layout_patches_small_changes(service: LineageService) {
    let first = service.global_layout(None, false).await.unwrap();
    assert_eq!(first.strategy, LayoutStrategy::Full);
    let saved = SavedLayout::new(first.positions.clone(), 8);

    service
        .import(extra_node("seed_regions"), ImportMode::Merge)
        .await
        .unwrap();

    let patched = service.global_layout(Some(&saved), false).await.unwrap();
    assert_eq!(patched.strategy, LayoutStrategy::Incremental);
    assert_eq!(patched.diff.added, vec![NodeId::from("seed_regions")]);
    for (id, old) in &first.positions {
        let new = patched.positions[id];
        assert_eq!((new.x, new.y), (old.x, old.y), "{id} moved");
    }

    let forced = service.global_layout(Some(&saved), true).await.unwrap();
    assert_eq!(forced.strategy, LayoutStrategy::Full);
}

#[tokio::test]
async fn plain_namer_labels_by_distance() {
    let service = LineageService::new(Box::new(InMemoryGraphStore::from_snapshot(shop())), 4)
        .with_layer_namer(Box::new(PlainLayerNamer));

    let response = service
        .lineage(&LineageQuery::new("int_order_items", 2, 2))
        .await
        .unwrap()
        .unwrap();

    let names: Vec<&str> = response.view.layer_names.values().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["Upstream 2", "Upstream 1", "Anchor", "Downstream 1", "Downstream 2"]
    );
}
