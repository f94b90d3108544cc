//! View-scoped layout keyed by relative layer.

use super::LayoutConfig;
use super::topological::row_offset;
use crate::domain::{LayerRange, LocalPosition, NodeId, VisibleNode};
use std::collections::BTreeMap;

/// Position the nodes of one lineage view.
///
/// Nodes are grouped by relative layer and sorted by name (then ID) within
/// each group. The layer at `range.min` sits at the left margin; rows start
/// at y = 0. The result does not depend on input order.
#[must_use]
pub fn compute_local_layout(
    nodes: &[VisibleNode],
    range: LayerRange,
    config: &LayoutConfig,
) -> BTreeMap<NodeId, LocalPosition> {
    let mut groups: BTreeMap<i32, Vec<&VisibleNode>> = BTreeMap::new();
    for visible in nodes {
        groups
            .entry(visible.relative_layer)
            .or_default()
            .push(visible);
    }

    let mut positions = BTreeMap::new();
    for (layer, mut members) in groups {
        members.sort_by(|a, b| {
            a.node
                .name
                .cmp(&b.node.name)
                .then_with(|| a.node.id.cmp(&b.node.id))
        });
        let x = config.margin + f64::from(layer - range.min) * config.rank_spacing;
        for (row, visible) in members.into_iter().enumerate() {
            positions
                .entry(visible.node.id.clone())
                .or_insert(LocalPosition {
                    x,
                    y: row_offset(row, config),
                    relative_layer: layer,
                });
        }
    }
    positions
}
