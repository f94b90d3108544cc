//! Common test utilities shared across integration tests.

use std::path::Path;
use std::process::{Command, Output};
use tributary::domain::{Edge, Flow, Node, NodeId, NodeType};
use tributary::store::GraphSnapshot;

/// Run the tributary binary in the specified directory with colors off.
pub fn run_tributary_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tributary"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env("TRIBUTARY_ASCII", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute tributary binary")
}

/// Nodes named after their IDs.
pub fn nodes(specs: &[(&str, NodeType)]) -> Vec<Node> {
    specs
        .iter()
        .map(|(id, node_type)| Node::new(*id, *id, *node_type))
        .collect()
}

/// Edges `e0`, `e1`, ... in the given order.
pub fn edges(pairs: &[(&str, &str)]) -> Vec<Edge> {
    pairs
        .iter()
        .enumerate()
        .map(|(i, (from, to))| Edge::new(format!("e{i}"), *from, *to))
        .collect()
}

/// A flow with the given members.
pub fn flow(id: &str, members: &[&str]) -> Flow {
    Flow {
        id: id.to_string(),
        name: id.to_string(),
        anchor_nodes: members.first().map(|m| NodeId::from(*m)).into_iter().collect(),
        member_nodes: members.iter().map(|m| NodeId::from(*m)).collect(),
        user_defined: false,
        inference_reason: Some("shared prefix".to_string()),
    }
}

/// A small shop warehouse:
///
/// ```text
/// raw_orders    -> stg_orders    -> int_order_items -> fct_orders -> rpt_revenue
/// raw_customers -> stg_customers -> dim_customers ----------------> rpt_revenue
///                  stg_customers -----------------------> fct_orders
/// ```
///
/// Flow `orders` covers the top row up to `fct_orders`.
pub fn shop() -> GraphSnapshot {
    GraphSnapshot {
        nodes: nodes(&[
            ("raw_orders", NodeType::Source),
            ("raw_customers", NodeType::Source),
            ("stg_orders", NodeType::Model),
            ("stg_customers", NodeType::Model),
            ("int_order_items", NodeType::Model),
            ("dim_customers", NodeType::Table),
            ("fct_orders", NodeType::Table),
            ("rpt_revenue", NodeType::Model),
        ]),
        edges: edges(&[
            ("raw_orders", "stg_orders"),
            ("raw_customers", "stg_customers"),
            ("stg_orders", "int_order_items"),
            ("int_order_items", "fct_orders"),
            ("stg_customers", "dim_customers"),
            ("stg_customers", "fct_orders"),
            ("fct_orders", "rpt_revenue"),
            ("dim_customers", "rpt_revenue"),
        ]),
        flows: vec![flow(
            "orders",
            &["raw_orders", "stg_orders", "int_order_items", "fct_orders"],
        )],
    }
}

/// Write a snapshot as JSONL files into `dir`.
pub fn write_snapshot(dir: &Path, snapshot: &GraphSnapshot) {
    fn write_lines<T: serde::Serialize>(path: &Path, records: &[T]) {
        let mut content = String::new();
        for record in records {
            content.push_str(&serde_json::to_string(record).unwrap());
            content.push('\n');
        }
        std::fs::write(path, content).unwrap();
    }

    write_lines(&dir.join("nodes.jsonl"), &snapshot.nodes);
    write_lines(&dir.join("edges.jsonl"), &snapshot.edges);
    write_lines(&dir.join("flows.jsonl"), &snapshot.flows);
}
