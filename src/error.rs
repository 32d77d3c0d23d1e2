use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required column '{column}' in {input}")]
    MissingColumn { input: String, column: String },

    #[error("Invalid numeric value '{value}' for column '{column}' at line {line} of {input}")]
    InvalidNumber {
        input: String,
        line: u64,
        column: String,
        value: String,
    },

    #[error("Unknown region tag: {0}")]
    UnknownRegion(String),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Ledger table not found: {0}")]
    TableNotFound(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
