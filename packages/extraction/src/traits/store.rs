//! Storage trait for the canonical record set.
//!
//! The store is the only persisted state of a harvest. A run seeds itself
//! from it, checkpoints into it, and finishes by writing the final set.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::types::product::ProductRecord;

/// Persistent array of product records.
///
/// Round-trip contract: `save(load())` writes an equivalent array. Array
/// order is preserved; field order within an object may differ.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load every stored record, in stored order. A store that does not
    /// exist yet loads as empty.
    async fn load(&self) -> StoreResult<Vec<ProductRecord>>;

    /// Replace the stored set.
    async fn save(&self, records: &[ProductRecord]) -> StoreResult<()>;
}
