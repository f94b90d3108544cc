//! CLI argument structs for all commands.

use clap::Parser;

use super::validators::{validate_flow_id, validate_node_id};
use crate::domain::NodeId;

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Reinitialize an existing workspace
    ///
    /// Rewrites the default config. Existing snapshot files are kept.
    #[arg(short, long)]
    pub force: bool,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug, Clone)]
pub struct InfoArgs {}

/// Arguments for the `view` command
#[derive(Parser, Debug, Clone)]
pub struct ViewArgs {
    /// Node to center the view on
    #[arg(value_parser = validate_node_id)]
    pub anchor: NodeId,

    /// Upstream depth (clamped to 0-10; defaults to the config value)
    #[arg(short, long, allow_negative_numbers = true)]
    pub upstream: Option<i64>,

    /// Downstream depth (clamped to 0-10; defaults to the config value)
    #[arg(short, long, allow_negative_numbers = true)]
    pub downstream: Option<i64>,

    /// Only traverse members of this flow
    #[arg(long, value_parser = validate_flow_id)]
    pub flow: Option<String>,

    /// Also stretch the view around this node
    #[arg(long, value_parser = validate_node_id)]
    pub focus: Option<NodeId>,

    /// Show flow members that traversal did not reach
    #[arg(long)]
    pub show_orphans: bool,
}

/// Arguments for the `path` command
#[derive(Parser, Debug, Clone)]
pub struct PathArgs {
    /// Starting node
    #[arg(value_parser = validate_node_id)]
    pub from: NodeId,

    /// Target node
    #[arg(value_parser = validate_node_id)]
    pub to: NodeId,
}

/// Arguments for the `layout` command
#[derive(Parser, Debug, Clone)]
pub struct LayoutArgs {
    /// Write the result to the layout file
    #[arg(short, long)]
    pub save: bool,

    /// Ignore the saved layout and place every node from scratch
    #[arg(long)]
    pub full: bool,
}
