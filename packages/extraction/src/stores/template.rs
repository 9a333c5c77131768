//! Splicing the record set into a host document.
//!
//! The host carries one `const data = [ ... ];` assignment. Everything from
//! the marker up to the first `];` after it is replaced; the rest of the
//! document is left byte-for-byte alone.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use super::write_atomic;
use crate::error::{StoreError, StoreResult};
use crate::types::product::ProductRecord;

const MARKER: &str = "const data = [";
const TERMINATOR: &str = "];";

/// Replace the data array in `host` with `values`, pretty-printed.
pub fn splice_data_array<T: Serialize>(host: &str, values: &[T]) -> StoreResult<String> {
    let start = host.find(MARKER).ok_or(StoreError::MarkerNotFound)?;
    let end = host[start..]
        .find(TERMINATOR)
        .map(|offset| start + offset + TERMINATOR.len())
        .ok_or(StoreError::UnterminatedArray { start })?;

    let json = serde_json::to_string_pretty(values)?;

    let mut out = String::with_capacity(host.len() + json.len());
    out.push_str(&host[..start]);
    out.push_str("const data = ");
    out.push_str(&json);
    out.push(';');
    out.push_str(&host[end..]);
    Ok(out)
}

/// A host document on disk that receives the final record set.
#[derive(Debug, Clone)]
pub struct TemplateSink {
    path: PathBuf,
}

impl TemplateSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Splice `records` into the host file. A host without the marker is
    /// reported as [`StoreError::MarkerNotFound`] and left untouched.
    pub async fn write(&self, records: &[ProductRecord]) -> StoreResult<()> {
        let host = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;

        let spliced = splice_data_array(&host, records)?;
        write_atomic(&self.path, &spliced).await?;
        info!(path = %self.path.display(), count = records.len(), "Template updated");
        Ok(())
    }
}
