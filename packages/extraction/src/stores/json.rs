//! JSON file store: the canonical persisted state.

use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::write_atomic;
use crate::error::{StoreError, StoreResult};
use crate::traits::store::RecordStore;
use crate::types::product::ProductRecord;

/// UTF-8, pretty-printed (2-space) array of product records.
///
/// A missing or blank file loads as an empty array.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load(&self) -> StoreResult<Vec<ProductRecord>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Store does not exist yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        let values: Vec<Value> = serde_json::from_str(&contents)?;
        let total = values.len();
        let records: Vec<ProductRecord> = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(path = %self.path.display(), index, error = %e, "Skipping unreadable stored record");
                    None
                }
            })
            .collect();
        debug!(
            path = %self.path.display(),
            count = records.len(),
            skipped = total - records.len(),
            "Loaded store"
        );
        Ok(records)
    }

    async fn save(&self, records: &[ProductRecord]) -> StoreResult<()> {
        let mut json = serde_json::to_string_pretty(records)?;
        json.push('\n');
        write_atomic(&self.path, &json).await?;
        info!(path = %self.path.display(), count = records.len(), "Store written");
        Ok(())
    }
}
