//! Post-crawl processing of buffered records.
//!
//! [`freshness`] → [`dedup`] → identifier assignment → batch insert, driven
//! by [`ingest::IngestionPipeline`].

pub mod dedup;
pub mod freshness;
pub mod ingest;

pub use freshness::{DEFAULT_RETENTION_DAYS, FreshnessFilter};
pub use ingest::{IngestOptions, IngestReport, IngestionPipeline};
