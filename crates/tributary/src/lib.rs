//! Tributary - explore data-pipeline lineage graphs.
//!
//! The library centers a view on one node of a producer-to-consumer graph:
//! bounded upstream and downstream traversal, optional flow filtering and a
//! focus node, ghost nodes at the border, and stable layouts.
//!
//! - [`traversal`]: depth-bounded walks and shortest relationship paths
//! - [`visibility`]: which nodes a view shows and on which relative layer
//! - [`layout`]: global topological, per-view and incremental layouts
//! - [`cache`]: LRU memoization of computed views
//! - [`service`]: the above wired to a [`store::GraphStore`]
//!
//! The `tributary` binary drives the same service over a `.tributary/`
//! workspace of JSONL files.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod cache;
pub mod domain;
pub mod error;
pub mod graph;
pub mod layer_naming;
pub mod layout;
pub mod service;
pub mod store;
pub mod traversal;
pub mod visibility;

// Workspace, configuration and CLI
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod output;
