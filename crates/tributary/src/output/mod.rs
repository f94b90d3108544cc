//! Output formatting for CLI commands.
//!
//! Every command prints either human-readable text or pretty JSON. The text
//! renderers write to any [`Write`] so they can be tested without a terminal.
//!
//! Submodules:
//! - [`color`]: Color and styling helpers (semantic colors, icons)

pub mod color;

use crate::domain::{NodeId, VisibilityReason};
use crate::layer_naming::{LayerNamer, PlainLayerNamer};
use crate::layout::{IncrementalLayoutResult, LayoutStrategy};
use crate::service::{LineageView, PositionedNode};
use crate::traversal::{PathDirection, RelationshipPath};
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::io::{self, Write};

pub use color::{error, info, success, warning};

use color::{arrow, bold, colored_reason_icon, colorize_reason, dimmed, rule};

// ============================================================================
// Output Configuration
// ============================================================================

const DEFAULT_TERMINAL_WIDTH: usize = 80;

/// Widest rule drawn under headings.
const MAX_RULE_WIDTH: usize = 60;

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Terminal width in columns.
    pub width: usize,
    /// Whether to use ASCII-only icons instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new `OutputConfig` with explicit values.
    pub fn new(width: usize, use_ascii: bool, use_colors: bool) -> Self {
        Self {
            width,
            use_ascii,
            use_colors,
        }
    }

    /// Create an `OutputConfig` from the terminal and environment.
    ///
    /// Reads:
    /// - `TRIBUTARY_ASCII`: Set to "1" or "true" for ASCII-only icons (default: false)
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `TRIBUTARY_COLOR`: Set to "0" or "false" to disable colors (default: true)
    pub fn from_env() -> Self {
        let use_ascii = match env::var("TRIBUTARY_ASCII") {
            Ok(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Ok(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Ok(v) => {
                tracing::warn!(
                    env_var = "TRIBUTARY_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            Err(_) => false,
        };

        // https://no-color.org/
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("TRIBUTARY_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            width: terminal_width(),
            use_ascii,
            use_colors,
        }
    }

    fn rule(&self) -> String {
        rule(self).repeat(self.width.min(MAX_RULE_WIDTH))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_TERMINAL_WIDTH,
            use_ascii: false,
            use_colors: true,
        }
    }
}

fn terminal_width() -> usize {
    terminal_size::terminal_size().map_or(DEFAULT_TERMINAL_WIDTH, |(w, _)| usize::from(w.0))
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

/// Print a value as pretty JSON to stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(handle, "{json}")
}

/// JSON shape of a lineage view.
#[derive(Debug, Serialize)]
pub struct ViewJson<'a> {
    /// The view
    #[serde(flatten)]
    pub view: &'a LineageView,

    /// Whether it was served from the cache
    pub cache_hit: bool,
}

// ============================================================================
// Lineage View
// ============================================================================

/// Render a lineage view grouped by relative layer.
///
/// Ghost nodes are listed under their layer after the visible nodes.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_view<W: Write>(w: &mut W, view: &LineageView, config: &OutputConfig) -> io::Result<()> {
    let anchor = &view.anchor;
    writeln!(
        w,
        "{} {} ({})",
        bold("Lineage of", config),
        colorize_reason(&anchor.name, VisibilityReason::Anchor, config),
        anchor.node_type
    )?;
    writeln!(
        w,
        "{}",
        dimmed(
            &format!(
                "layers {}..{}, {} nodes ({} upstream, {} downstream), {} ghosts, {} edges",
                view.layer_range.min,
                view.layer_range.max,
                view.stats.visible_nodes,
                view.stats.upstream_nodes,
                view.stats.downstream_nodes,
                view.stats.ghost_nodes,
                view.stats.edges
            ),
            config
        )
    )?;

    let mut by_layer: BTreeMap<i32, (Vec<&PositionedNode>, Vec<&PositionedNode>)> = BTreeMap::new();
    for node in &view.nodes {
        by_layer.entry(node.visible.relative_layer).or_default().0.push(node);
    }
    for ghost in &view.ghost_nodes {
        by_layer.entry(ghost.visible.relative_layer).or_default().1.push(ghost);
    }

    for (layer, (visible, ghosts)) in by_layer {
        let name = view
            .layer_names
            .get(&layer)
            .cloned()
            .unwrap_or_else(|| PlainLayerNamer.name_layer(layer, &[]));
        writeln!(w)?;
        writeln!(w, "{} {}", bold(&name, config), dimmed(&format!("[{layer:+}]"), config))?;
        for node in visible.into_iter().chain(ghosts) {
            write_view_node(w, node, config)?;
        }
    }
    Ok(())
}

fn write_view_node<W: Write>(w: &mut W, node: &PositionedNode, config: &OutputConfig) -> io::Result<()> {
    let reason = node.visible.visibility_reason;
    let mut line = format!(
        "  {} {} {}",
        colored_reason_icon(reason, config),
        colorize_reason(&node.visible.node.name, reason, config),
        dimmed(&format!("({})", node.visible.node.node_type), config),
    );
    if node.visible.node.name != node.visible.node.id.as_str() {
        line.push_str(&dimmed(&format!(" id={}", node.visible.node.id), config));
    }
    if !matches!(
        reason,
        VisibilityReason::Anchor
            | VisibilityReason::Upstream
            | VisibilityReason::Downstream
    ) {
        line.push_str(&dimmed(&format!(" {reason}"), config));
    }
    writeln!(w, "{line}")
}

// ============================================================================
// Relationship Path
// ============================================================================

/// Render the relationship between two nodes.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_path<W: Write>(
    w: &mut W,
    from: &NodeId,
    to: &NodeId,
    path: Option<&RelationshipPath>,
    config: &OutputConfig,
) -> io::Result<()> {
    let Some(path) = path else {
        return writeln!(w, "{} and {} are not connected", info(from.as_str(), config), info(to.as_str(), config));
    };

    let relation = match path.direction {
        PathDirection::Downstream => "downstream of",
        PathDirection::Upstream => "upstream of",
    };
    let hops = if path.hops == 1 { "hop" } else { "hops" };
    writeln!(
        w,
        "{} is {relation} {} ({} {hops})",
        info(to.as_str(), config),
        info(from.as_str(), config),
        path.hops
    )?;

    let chain: Vec<&str> = std::iter::once(from.as_str())
        .chain(path.intermediates.iter().map(NodeId::as_str))
        .chain(std::iter::once(to.as_str()))
        .collect();
    let separator = format!(" {} ", arrow(config));
    writeln!(w, "  {}", chain.join(&separator))
}

// ============================================================================
// Global Layout
// ============================================================================

/// Summarize a global layout run.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_layout<W: Write>(w: &mut W, result: &IncrementalLayoutResult, config: &OutputConfig) -> io::Result<()> {
    let strategy = match result.strategy {
        LayoutStrategy::Full => "full",
        LayoutStrategy::Incremental => "incremental",
    };
    writeln!(
        w,
        "{} {} nodes in {} layers ({strategy})",
        bold("Layout:", config),
        result.positions.len(),
        result.bounds.layer_count
    )?;
    writeln!(
        w,
        "  bounds {:.0} x {:.0}",
        result.bounds.width, result.bounds.height
    )?;
    writeln!(
        w,
        "  {} added, {} removed, {} unchanged{}",
        result.diff.added.len(),
        result.diff.removed.len(),
        result.diff.unchanged.len(),
        if result.diff.topology_changed {
            warning(", edge count changed significantly", config)
        } else {
            String::new()
        }
    )?;
    writeln!(w, "{}", dimmed(&config.rule(), config))?;
    for (layer, ids) in &result.layers {
        let names: Vec<&str> = ids.iter().map(NodeId::as_str).collect();
        writeln!(w, "  {:>3}  {}", layer, names.join(", "))?;
    }
    Ok(())
}
