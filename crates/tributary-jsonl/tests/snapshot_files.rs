//! File-level tests for reading and writing graph snapshot files.

use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tributary_jsonl::{Warning, read_jsonl_resilient, write_jsonl_atomic};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct EdgeRow {
    id: String,
    from: String,
    to: String,
}

fn edge(id: &str, from: &str, to: &str) -> EdgeRow {
    EdgeRow {
        id: id.to_string(),
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[tokio::test]
async fn written_file_reads_back_in_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("edges.jsonl");
    let edges = vec![
        edge("e1", "raw_orders", "stg_orders"),
        edge("e2", "stg_orders", "fct_orders"),
    ];

    write_jsonl_atomic(&path, &edges).await.unwrap();
    let (loaded, warnings) = read_jsonl_resilient::<EdgeRow, _>(&path).await.unwrap();

    assert!(warnings.is_empty());
    assert_eq!(loaded, edges);
}

#[tokio::test]
async fn partially_corrupted_export_keeps_good_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("edges.jsonl");
    let contents = concat!(
        "{\"id\":\"e1\",\"from\":\"a\",\"to\":\"b\"}\n",
        "{\"id\":\"e2\",\"from\":\"b\"\n",
        "\n",
        "{\"id\":\"e3\",\"from\":\"b\",\"target\":\"c\"}\n",
        "{\"id\":\"e4\",\"from\":\"c\",\"to\":\"d\"}\n",
    );
    tokio::fs::write(&path, contents).await.unwrap();

    let (loaded, warnings) = read_jsonl_resilient::<EdgeRow, _>(&path).await.unwrap();

    assert_eq!(loaded, vec![edge("e1", "a", "b"), edge("e4", "c", "d")]);
    assert_eq!(warnings.len(), 2);
    assert!(matches!(
        warnings[0],
        Warning::MalformedJson { line_number: 2, .. }
    ));
    assert!(matches!(
        warnings[1],
        Warning::SkippedLine { line_number: 4, .. }
    ));
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let result = read_jsonl_resilient::<EdgeRow, _>(dir.path().join("absent.jsonl")).await;
    assert!(matches!(result, Err(tributary_jsonl::Error::Io(_))));
}

#[tokio::test]
async fn empty_file_has_no_records_and_no_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flows.jsonl");
    write_jsonl_atomic::<EdgeRow, _>(&path, &[]).await.unwrap();

    let (loaded, warnings) = read_jsonl_resilient::<EdgeRow, _>(&path).await.unwrap();

    assert!(loaded.is_empty());
    assert!(warnings.is_empty());
}
