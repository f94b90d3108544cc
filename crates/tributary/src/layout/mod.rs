//! Node positioning.
//!
//! - [`topological`]: global longest-path layering for the whole graph
//! - [`local`]: compact per-view positions keyed by relative layer
//! - [`incremental`]: diff against a previous global layout and patch it
//!   when the change is small

pub mod incremental;
pub mod local;
pub mod topological;

use crate::domain::{NodeId, Position};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use incremental::{
    IncrementalLayoutResult, LayoutDiff, LayoutStrategy, compute_layout_diff,
    compute_layout_with_diff, should_use_incremental_layout,
};
pub use local::compute_local_layout;
pub use topological::{LayoutBounds, TopologicalLayout, compute_layers, precompute_layout};

/// Spacing constants shared by every layout pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Offset of the first layer and first row from the origin
    pub margin: f64,

    /// Horizontal distance between adjacent layers
    pub rank_spacing: f64,

    /// Rendered node width
    pub node_width: f64,

    /// Rendered node height
    pub node_height: f64,

    /// Vertical gap between stacked nodes
    pub node_gap: f64,

    /// Extra vertical clearance required during collision resolution
    pub collision_padding: f64,

    /// Upper bound on collision-resolution sweeps
    pub max_collision_iterations: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: 50.0,
            rank_spacing: 300.0,
            node_width: 200.0,
            node_height: 60.0,
            node_gap: 40.0,
            collision_padding: 20.0,
            max_collision_iterations: 50,
        }
    }
}

impl LayoutConfig {
    /// Distance between the tops of two stacked nodes.
    #[must_use]
    pub fn row_pitch(&self) -> f64 {
        self.node_height + self.node_gap
    }

    /// X coordinate of a global layer.
    #[must_use]
    pub fn layer_x(&self, layer: u32) -> f64 {
        self.margin + f64::from(layer) * self.rank_spacing
    }
}

/// A global layout persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLayout {
    /// When the layout was computed
    pub generated_at: DateTime<Utc>,

    /// Edge count of the graph the layout was computed for
    pub edge_count: usize,

    /// Position of every node
    pub positions: BTreeMap<NodeId, Position>,
}

impl SavedLayout {
    /// Stamp a set of positions with the current time.
    #[must_use]
    pub fn new(positions: BTreeMap<NodeId, Position>, edge_count: usize) -> Self {
        Self {
            generated_at: Utc::now(),
            edge_count,
            positions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: LayoutConfig = serde_yaml::from_str("rank_spacing: 120.0\n").unwrap();
        assert!((config.rank_spacing - 120.0).abs() < f64::EPSILON);
        assert!((config.margin - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.max_collision_iterations, 50);
    }

    #[test]
    fn layer_x_steps_by_rank_spacing() {
        let config = LayoutConfig::default();
        assert!((config.layer_x(0) - 50.0).abs() < f64::EPSILON);
        assert!((config.layer_x(2) - 650.0).abs() < f64::EPSILON);
    }
}
