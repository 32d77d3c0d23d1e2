// Pipeline processing: merging, deduplication, filtering, and validation

pub mod report;
pub mod transform;
pub mod validate;

pub use transform::{merge, merge_with_stats, MergeStats};
pub use validate::{validate, ValidationReport};
