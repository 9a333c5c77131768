//! Typed errors for the extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Absence of data is never an error here: a field that no heuristic could
//! recover is an `Option::None` on the record.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while talking to the target site.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Server answered with a non-2xx status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Connection or read timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Every retry attempt failed with a transient error
    #[error("gave up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        last: Box<CrawlError>,
    },
}

impl CrawlError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            CrawlError::Http(_) | CrawlError::Timeout { .. } => true,
            CrawlError::Status { status, .. } => *status == 429 || *status >= 500,
            CrawlError::InvalidUrl { .. } | CrawlError::RetriesExhausted { .. } => false,
        }
    }

    pub(crate) fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            CrawlError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = error.status() {
            CrawlError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            CrawlError::Http(Box::new(error))
        }
    }
}

/// Errors raised by a single extraction strategy on a single input.
///
/// These never escape an extraction pass: the pass logs them and moves on
/// to the next fragment or the next strategy.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Fragment looked like JSON but did not decode
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSS selector failed to compile
    #[error("invalid selector `{selector}`")]
    Selector { selector: String },

    /// Input had none of the structure the strategy looks for
    #[error("no recognizable structure: {0}")]
    NoStructure(String),
}

/// Errors from the persistence collaborators (record store, template sink).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem read or write failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Store contents are not a valid product array
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Host document has no `const data = [` marker
    #[error("data array marker not found")]
    MarkerNotFound,

    /// Marker found but no closing `];` follows it
    #[error("data array starting at byte {start} is never closed")]
    UnterminatedArray { start: usize },
}

/// Result type alias for crawl operations.
pub type CrawlResult<T> = std::result::Result<T, CrawlError>;

/// Result type alias for a single extraction strategy.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
