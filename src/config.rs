use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{LedgerError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DATABASE_ENV: &str = "SALES_LEDGER_DATABASE";
pub const TABLE_ENV: &str = "SALES_LEDGER_TABLE";

static TABLE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

/// Returns true when `name` can be used as an unescaped SQL table identifier.
pub fn is_valid_table_name(name: &str) -> bool {
    TABLE_NAME.is_match(name)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub region_a: PathBuf,
    pub region_b: PathBuf,
    pub delimiter: char,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            region_a: PathBuf::from("order_region_a.csv"),
            region_b: PathBuf::from("order_region_b.csv"),
            delimiter: ',',
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database: PathBuf,
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("sales_data.db"),
            table: "sales_data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_name: "sales_ledger.log".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or from `config.toml` when it exists.
    ///
    /// Missing keys fall back to defaults. An explicit `path` that cannot be
    /// read is an error; an absent default file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?,
            None => {
                debug!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
                Self::default()
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("Failed to read config file '{}': {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(database) = lookup(DATABASE_ENV) {
            self.store.database = PathBuf::from(database);
        }
        if let Some(table) = lookup(TABLE_ENV) {
            self.store.table = table;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !is_valid_table_name(&self.store.table) {
            return Err(LedgerError::Config(format!(
                "store.table '{}' is not a plain SQL identifier",
                self.store.table
            )));
        }
        self.delimiter_byte()?;
        Ok(())
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        let delimiter = self.sources.delimiter;
        if !delimiter.is_ascii() {
            return Err(LedgerError::Config(format!(
                "sources.delimiter '{}' must be a single ASCII character",
                delimiter
            )));
        }
        Ok(delimiter as u8)
    }
}
