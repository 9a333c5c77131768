//! Water product extraction library.
//!
//! Recovers product and contaminant records from a site with no stable API:
//! a search endpoint that answers with streamed component markup, and
//! product pages whose layout is not guaranteed.
//!
//! # Design Philosophy
//!
//! - Every heuristic is a named strategy in an explicit, ordered chain
//! - Absence is `None`, not an error; errors stay at the smallest scope
//! - A status is always derived from the values it summarizes
//! - Best-effort output over guaranteed correctness
//!
//! # Usage
//!
//! ```rust,ignore
//! use water_extraction::{
//!     default_queries, HarvestConfig, Harvester, HttpIngestor, JsonFileStore, RateLimitedIngestor,
//! };
//!
//! let config = HarvestConfig::default();
//! let ingestor = RateLimitedIngestor::new(HttpIngestor::new(&config)?, config.requests_per_second);
//! let mut harvester = Harvester::new(config, ingestor, JsonFileStore::new("data.json"));
//!
//! let report = harvester.run(&default_queries()).await?;
//! println!("{} records, {}", report.records_written, report.status_breakdown);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Transport and storage seams (Ingestor, RecordStore)
//! - [`types`] - Products, contaminants, fragments, configuration
//! - [`pipeline`] - Extraction strategies, merging, synthesis, the harvest run
//! - [`ingestors`] - HTTP, rate-limited and mock ingestors
//! - [`stores`] - JSON file and in-memory stores, template splice

pub mod error;
pub mod ingestors;
pub mod pipeline;
pub mod stores;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{CrawlError, CrawlResult, ParseError, ParseResult, StoreError, StoreResult};
pub use ingestors::{HttpIngestor, MockIngestor, RateLimitedIngestor};
pub use pipeline::{
    classify_status, default_queries, extract_numeric, Catalog, ContaminantTableExtractor,
    HarvestReport, Harvester, ProductPageExtractor, StatusBreakdown, StreamRecordExtractor,
    SyntheticContaminantGenerator,
};
pub use stores::{splice_data_array, JsonFileStore, MemoryStore, TemplateSink};
pub use traits::{
    ingestor::{Ingestor, RawPage},
    store::RecordStore,
};
pub use types::{
    config::{HarvestConfig, RetryPolicy},
    contaminant::{ContaminantRecord, Status, NOT_DETECTED},
    fragment::{Origin, ProductFragment},
    product::{Packaging, ProductRecord, WaterSource, WaterType},
};
