//! Ingestor implementations.
//!
//! - `HttpIngestor` - the site's search and product page contracts over HTTP
//! - `RateLimitedIngestor` - request pacing for any ingestor
//! - `MockIngestor` - canned responses for tests

mod http;
mod mock;
mod rate_limited;

pub use http::HttpIngestor;
pub use mock::MockIngestor;
pub use rate_limited::RateLimitedIngestor;

// Re-export from traits for convenience
pub use crate::traits::ingestor::{Ingestor, RawPage};
