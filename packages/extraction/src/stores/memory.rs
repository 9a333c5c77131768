//! In-memory record store for tests and dry runs.

use async_trait::async_trait;
use std::sync::{PoisonError, RwLock};

use crate::error::StoreResult;
use crate::traits::store::RecordStore;
use crate::types::product::ProductRecord;

/// Keeps the current record set plus a copy of every save, so tests can
/// check checkpoints as well as the final write.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<ProductRecord>>,
    saves: RwLock<Vec<Vec<ProductRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `records` already stored.
    pub fn with_records(records: Vec<ProductRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            saves: RwLock::new(Vec::new()),
        }
    }

    /// Current stored set.
    pub fn records(&self) -> Vec<ProductRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every saved set, oldest first.
    pub fn saves(&self) -> Vec<Vec<ProductRecord>> {
        self.saves
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load(&self) -> StoreResult<Vec<ProductRecord>> {
        Ok(self.records())
    }

    async fn save(&self, records: &[ProductRecord]) -> StoreResult<()> {
        *self.records.write().unwrap_or_else(PoisonError::into_inner) = records.to_vec();
        self.saves
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(records.to_vec());
        Ok(())
    }
}
