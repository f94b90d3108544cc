//! Labels for relative layers.
//!
//! Naming is a pure function of a layer's number and its nodes, kept behind
//! [`LayerNamer`] so the service can swap strategies.

use crate::domain::{NodeType, VisibleNode};
use std::collections::{BTreeMap, HashMap};

/// Produces a display label for one relative layer.
pub trait LayerNamer: Send + Sync {
    /// Label for `layer`, given the nodes placed on it.
    fn name_layer(&self, layer: i32, nodes: &[&VisibleNode]) -> String;
}

/// Label every layer that has at least one node.
#[must_use]
pub fn name_layers(namer: &dyn LayerNamer, nodes: &[VisibleNode]) -> BTreeMap<i32, String> {
    let mut by_layer: BTreeMap<i32, Vec<&VisibleNode>> = BTreeMap::new();
    for node in nodes {
        by_layer.entry(node.relative_layer).or_default().push(node);
    }
    by_layer
        .into_iter()
        .map(|(layer, members)| (layer, namer.name_layer(layer, &members)))
        .collect()
}

/// "Anchor", "Upstream N", "Downstream N".
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainLayerNamer;

impl LayerNamer for PlainLayerNamer {
    fn name_layer(&self, layer: i32, _nodes: &[&VisibleNode]) -> String {
        match layer {
            0 => "Anchor".to_string(),
            l if l < 0 => format!("Upstream {}", l.unsigned_abs()),
            l => format!("Downstream {l}"),
        }
    }
}

/// Names layers after the naming convention most of their nodes share.
///
/// `stg_orders`, `stg_customers` → "Staging". Unknown prefixes are shown
/// upper-cased next to the layer's most common node type ("RPT Models").
/// Falls back to [`PlainLayerNamer`] when no prefix covers more than half of
/// the layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixLayerNamer;

impl PrefixLayerNamer {
    fn known_prefix(prefix: &str) -> Option<&'static str> {
        match prefix {
            "stg" | "staging" => Some("Staging"),
            "int" | "intermediate" => Some("Intermediate"),
            "fct" | "fact" => Some("Facts"),
            "dim" => Some("Dimensions"),
            "src" | "raw" | "source" => Some("Raw Sources"),
            "base" => Some("Base"),
            "mart" | "marts" => Some("Marts"),
            _ => None,
        }
    }

    fn plural(node_type: NodeType) -> &'static str {
        match node_type {
            NodeType::Source => "Sources",
            NodeType::Model => "Models",
            NodeType::View => "Views",
            NodeType::Table => "Tables",
            NodeType::Seed => "Seeds",
            NodeType::External => "Externals",
            NodeType::Mart => "Marts",
            NodeType::Other => "Nodes",
        }
    }

    /// First `_`- or `.`-separated token, if the name has a separator.
    fn prefix_of(name: &str) -> Option<String> {
        let (head, _) = name.split_once(['_', '.'])?;
        (!head.is_empty()).then(|| head.to_ascii_lowercase())
    }

    /// Most frequent value covering more than half of `total`; ties go to the smaller value.
    fn dominant<T: Ord + Copy + std::hash::Hash>(
        values: impl IntoIterator<Item = T>,
        total: usize,
    ) -> Option<T> {
        let mut counts: HashMap<T, usize> = HashMap::new();
        for value in values {
            *counts.entry(value).or_default() += 1;
        }
        counts
            .into_iter()
            .max_by(|(a, count_a), (b, count_b)| count_a.cmp(count_b).then_with(|| b.cmp(a)))
            .filter(|(_, count)| count * 2 > total)
            .map(|(value, _)| value)
    }
}

impl LayerNamer for PrefixLayerNamer {
    fn name_layer(&self, layer: i32, nodes: &[&VisibleNode]) -> String {
        if layer == 0 || nodes.is_empty() {
            return PlainLayerNamer.name_layer(layer, nodes);
        }

        let prefixes: Vec<String> = nodes
            .iter()
            .filter_map(|visible| Self::prefix_of(&visible.node.name))
            .collect();
        let Some(prefix) = Self::dominant(prefixes.iter().map(String::as_str), nodes.len()) else {
            return PlainLayerNamer.name_layer(layer, nodes);
        };

        if let Some(label) = Self::known_prefix(prefix) {
            return label.to_string();
        }

        let node_type = Self::dominant(
            nodes.iter().map(|visible| visible.node.node_type.as_str()),
            nodes.len(),
        )
        .and_then(|label| {
            nodes
                .iter()
                .map(|visible| visible.node.node_type)
                .find(|node_type| node_type.as_str() == label)
        })
        .unwrap_or(NodeType::Other);

        format!("{} {}", prefix.to_ascii_uppercase(), Self::plural(node_type))
    }
}
