//! Regional order ingestion into a validated SQLite sales ledger.

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;

pub use config::Config;
pub use domain::{MergedOrderRecord, RawOrderRecord, Region, TaggedOrder};
pub use error::{LedgerError, Result};
pub use pipeline::processing::{merge, validate, ValidationReport};
pub use pipeline::{run, RunSummary};
