//! Crash-safe file replacement.
//!
//! Both helpers write to a sibling `.tmp` file first and rename it over the
//! target once the data is flushed. A rename within one filesystem is atomic
//! on POSIX, so readers see either the old file or the new one.

use crate::{JsonlWriter, Result};
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Atomically replaces `path` with one JSON line per record.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be written, a record fails
/// to serialize, or the final rename fails. The target is untouched on error.
///
/// # Examples
///
/// ```no_run
/// use tributary_jsonl::write_jsonl_atomic;
///
/// # async fn example() -> tributary_jsonl::Result<()> {
/// let rows = vec![serde_json::json!({"id": "stg_orders"})];
/// write_jsonl_atomic(".tributary/nodes.jsonl", &rows).await?;
/// # Ok(())
/// # }
/// ```
pub async fn write_jsonl_atomic<T, P>(path: P, records: &[T]) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    let result = async {
        let file = File::create(&temp_path).await?;
        let mut writer = JsonlWriter::new(file);
        writer.write_all(records).await?;
        writer.flush().await?;
        Ok(())
    }
    .await;

    finish(path, &temp_path, result).await
}

/// Atomically replaces `path` with raw bytes.
///
/// Used for whole-document files such as the saved layout.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be written or renamed.
pub async fn write_atomic<P: AsRef<Path>>(path: P, contents: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    let result = async {
        let mut file = File::create(&temp_path).await?;
        file.write_all(contents).await?;
        file.flush().await?;
        Ok(())
    }
    .await;

    finish(path, &temp_path, result).await
}

async fn finish(path: &Path, temp_path: &Path, result: Result<()>) -> Result<()> {
    if let Err(e) = result {
        // Best-effort cleanup; the write error is what matters.
        let _ = tokio::fs::remove_file(temp_path).await;
        return Err(e);
    }
    tokio::fs::rename(temp_path, path).await?;
    Ok(())
}

/// `nodes.jsonl` becomes `nodes.jsonl.tmp`; `layout` becomes `layout.tmp`.
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let extension = match path.extension() {
        Some(ext) => {
            let mut ext = ext.to_os_string();
            ext.push(".tmp");
            ext
        }
        None => OsString::from("tmp"),
    };
    temp_path.set_extension(extension);
    temp_path
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case::with_extension("/data/nodes.jsonl", "/data/nodes.jsonl.tmp")]
    #[case::without_extension("/data/layout", "/data/layout.tmp")]
    #[case::relative("edges.jsonl", "edges.jsonl.tmp")]
    fn temp_path_is_a_sibling(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(make_temp_path(Path::new(input)), Path::new(expected));
    }

    #[tokio::test]
    async fn write_atomic_replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layout.json");
        tokio::fs::write(&path, b"old").await.unwrap();

        write_atomic(&path, b"{\"positions\":{}}").await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "{\"positions\":{}}");
        assert!(!make_temp_path(&path).exists());
    }

    #[tokio::test]
    async fn failed_write_leaves_target_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing_dir").join("nodes.jsonl");

        let result = write_jsonl_atomic(&path, &[serde_json::json!({"id": "a"})]).await;

        assert!(result.is_err());
        assert!(!path.exists());
    }
}
