// Pipeline ingestion: reading regional order files into tagged records

pub mod reader;

pub use reader::{read_region, read_region_from, REQUIRED_COLUMNS};
