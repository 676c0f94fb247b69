//! JSON snapshot files shared by the in-memory stores.

use std::io;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Writes `records` as a pretty JSON array, creating parent directories.
pub(crate) async fn write_records<T: Serialize>(path: &Path, records: &[T]) -> io::Result<()> {
    let json = serde_json::to_vec_pretty(records)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, json).await
}

/// Reads records written by [`write_records`]. A missing file yields `None`.
pub(crate) async fn read_records<T: DeserializeOwned>(path: &Path) -> io::Result<Option<Vec<T>>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}
