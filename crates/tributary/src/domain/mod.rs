//! Domain types for lineage graphs.
//!
//! Nodes, edges and flows are produced by an external ingestion job and are
//! read-only here. The view types ([`VisibleNode`], [`Position`],
//! [`LocalPosition`], [`LayerRange`]) are what the engine computes from them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new node ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind of asset a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// Raw upstream source declaration
    Source,

    /// Transformation model
    Model,

    /// Database view
    View,

    /// Materialized table
    Table,

    /// Static seed data
    Seed,

    /// Asset owned by another system
    External,

    /// Business-facing mart
    Mart,

    /// Anything the ingestion job could not classify
    #[serde(other)]
    Other,
}

impl NodeType {
    /// Lowercase label used in output and layer names
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Model => "model",
            Self::View => "view",
            Self::Table => "table",
            Self::Seed => "seed",
            Self::External => "external",
            Self::Mart => "mart",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Precomputed global layout stored on a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeLayout {
    /// Horizontal position
    pub x: f64,

    /// Vertical position
    pub y: f64,

    /// Global topological layer
    pub layer: u32,
}

/// A table, model or other asset in the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,

    /// Display name
    pub name: String,

    /// Asset kind
    #[serde(rename = "type")]
    pub node_type: NodeType,

    /// Finer-grained kind (e.g. "incremental")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    /// Opaque metadata from ingestion
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,

    /// Precomputed global layout (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<NodeLayout>,

    /// Semantic layer tag (e.g. "staging", "marts")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_layer: Option<String>,
}

impl Node {
    /// Create a node with no subtype, metadata or layout
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            node_type,
            subtype: None,
            metadata: serde_json::Value::Null,
            layout: None,
            semantic_layer: None,
        }
    }
}

/// Producer → consumer relationship between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier
    pub id: String,

    /// Producing node
    pub from: NodeId,

    /// Consuming node
    pub to: NodeId,

    /// Relationship kind (e.g. "ref", "source")
    #[serde(rename = "type", default = "default_edge_type")]
    pub edge_type: String,

    /// Opaque metadata from ingestion
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

fn default_edge_type() -> String {
    "ref".to_string()
}

impl Edge {
    /// Create a `ref` edge with no metadata
    pub fn new(id: impl Into<String>, from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            edge_type: default_edge_type(),
            metadata: serde_json::Value::Null,
        }
    }
}

/// A named subset of the graph used to restrict traversal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flow {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Nodes the flow is organized around
    #[serde(default)]
    pub anchor_nodes: Vec<NodeId>,

    /// Every node belonging to the flow
    #[serde(default)]
    pub member_nodes: Vec<NodeId>,

    /// Whether a user created the flow by hand
    #[serde(default)]
    pub user_defined: bool,

    /// How an inferred flow was derived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_reason: Option<String>,
}

/// Why a node appears in a lineage view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisibilityReason {
    /// The node the view is centered on
    Anchor,

    /// Reached by walking edges backwards
    Upstream,

    /// Reached by walking edges forwards
    Downstream,

    /// Flow member not reached by traversal
    FlowMember,

    /// Reached only through the focus node
    FocusStretch,

    /// One edge away from the view but not part of it (ghost)
    AdjacentButExcluded,
}

impl VisibilityReason {
    /// Kebab-case label used in text output
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anchor => "anchor",
            Self::Upstream => "upstream",
            Self::Downstream => "downstream",
            Self::FlowMember => "flow-member",
            Self::FocusStretch => "focus-stretch",
            Self::AdjacentButExcluded => "adjacent-but-excluded",
        }
    }
}

impl fmt::Display for VisibilityReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node as it appears in a lineage view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleNode {
    /// The underlying node
    #[serde(flatten)]
    pub node: Node,

    /// Why it is in the view
    pub visibility_reason: VisibilityReason,

    /// Signed distance from the anchor; 0 is the anchor only
    pub relative_layer: i32,
}

/// Global layout position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal position
    pub x: f64,

    /// Vertical position
    pub y: f64,

    /// Global topological layer
    pub layer: u32,
}

/// View-scoped layout position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalPosition {
    /// Horizontal position
    pub x: f64,

    /// Vertical position
    pub y: f64,

    /// Relative layer the position was derived from
    pub relative_layer: i32,
}

/// Inclusive range of relative layers in a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LayerRange {
    /// Most negative (upstream) layer
    pub min: i32,

    /// Most positive (downstream) layer
    pub max: i32,
}

impl LayerRange {
    /// Smallest range containing every layer in the iterator, or `None` if empty
    pub fn from_layers(layers: impl IntoIterator<Item = i32>) -> Option<Self> {
        layers.into_iter().fold(None, |range, layer| {
            Some(match range {
                None => Self {
                    min: layer,
                    max: layer,
                },
                Some(Self { min, max }) => Self {
                    min: min.min(layer),
                    max: max.max(layer),
                },
            })
        })
    }

    /// Extend the range to include `layer`
    #[must_use]
    pub fn including(self, layer: i32) -> Self {
        Self {
            min: self.min.min(layer),
            max: self.max.max(layer),
        }
    }

    /// Whether `layer` falls inside the range
    #[must_use]
    pub fn contains(self, layer: i32) -> bool {
        (self.min..=self.max).contains(&layer)
    }
}
