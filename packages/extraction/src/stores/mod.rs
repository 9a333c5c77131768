//! Record stores and the template sink.
//!
//! Available backends:
//! - `JsonFileStore` - pretty-printed JSON array on disk
//! - `MemoryStore` - in-process, keeps every save (for tests)
//!
//! `TemplateSink` splices the final record set into a host document.

pub mod json;
pub mod memory;
pub mod template;

pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use template::{splice_data_array, TemplateSink};

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};

/// Write `contents` to a sibling temp file, then rename it over `path`.
pub(crate) async fn write_atomic(path: &Path, contents: &str) -> StoreResult<()> {
    let temp = temp_path(path);
    tokio::fs::write(&temp, contents)
        .await
        .map_err(|source| StoreError::Io {
            path: temp.clone(),
            source,
        })?;
    tokio::fs::rename(&temp, path)
        .await
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("store"));
    name.push(".tmp");
    path.with_file_name(name)
}
