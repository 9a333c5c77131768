//! Extraction pipeline - the core of the library.
//!
//! Leaves first:
//! - `numeric` / `classify` - measurement parsing and safety status
//! - `strategy` - ordered fallback chains
//! - `stream` - candidate records from the search stream
//! - `contaminants` / `categorize` / `page` - product page detail
//! - `synthetic` - risk-weighted profiles when no lab data exists
//! - `merge` - identity resolution and the catalog
//! - `harvest` - the run itself

pub mod categorize;
pub mod classify;
pub mod contaminants;
pub mod harvest;
pub mod merge;
pub mod numeric;
pub mod page;
pub mod queries;
pub mod stream;
pub mod strategy;
pub mod synthetic;

pub use categorize::{classify_packaging, classify_source, classify_type, CategoryRule};
pub use classify::{classify_status, classify_value};
pub use contaminants::ContaminantTableExtractor;
pub use harvest::{HarvestReport, Harvester, StatusBreakdown};
pub use merge::{Catalog, MergeOutcome};
pub use numeric::extract_numeric;
pub use page::ProductPageExtractor;
pub use queries::default_queries;
pub use stream::StreamRecordExtractor;
pub use strategy::{first_productive, ChainOutcome, Strategy};
pub use synthetic::{RiskFactors, SyntheticContaminantGenerator};
