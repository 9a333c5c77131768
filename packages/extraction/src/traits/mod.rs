//! Trait seams between the pipeline and the outside world.
//!
//! Applications pick the transport ([`ingestor::Ingestor`]) and the
//! persistence ([`store::RecordStore`]); the pipeline only sees the traits.

pub mod ingestor;
pub mod store;
