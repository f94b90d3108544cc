//! Saved global layout (`layout.json`).

use crate::error::{Result, StorageError};
use crate::layout::SavedLayout;
use std::path::Path;
use tributary_jsonl::write_atomic;

/// Read a saved layout, or `None` if the file does not exist.
///
/// # Errors
///
/// Returns [`StorageError::InvalidFormat`] if the file is not a saved layout.
pub async fn load_layout(path: &Path) -> Result<Option<SavedLayout>> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let layout = serde_json::from_str(&contents).map_err(|e| StorageError::InvalidFormat {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Some(layout))
}

/// Atomically write a layout as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`StorageError::Serialization`] if the write fails.
pub async fn save_layout(path: &Path, layout: &SavedLayout) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(layout)?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)
        .await
        .map_err(|source| StorageError::Serialization {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), nodes = layout.positions.len(), "Saved layout");
    Ok(())
}
