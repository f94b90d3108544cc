//! JSON Lines support for tributary graph snapshots.
//!
//! Graph snapshots (nodes, edges, flows) are stored as one JSON record per
//! line. Reading is *resilient*: a damaged line is reported as a [`Warning`]
//! and skipped, so one bad record never hides the rest of the graph. Writing
//! goes through a temp file and an atomic rename.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;
pub mod warning;
pub mod writer;

pub use atomic::{write_atomic, write_jsonl_atomic};
pub use error::{Error, Result};
pub use reader::{JsonlReader, read_jsonl_resilient};
pub use warning::Warning;
pub use writer::JsonlWriter;
