//! Configuration structures for the receipt pipeline.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{RcptError, Result};
use crate::receipt::rules::dates::DateFormat;

/// Main configuration for the rcpt pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RcptConfig {
    /// Line item extraction configuration.
    pub extraction: ExtractionConfig,

    /// Date resolution configuration.
    pub dates: DateConfig,

    /// Record store configuration.
    pub store: StoreConfig,
}

/// Line item extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Largest amount accepted on a line; larger values are treated as noise.
    pub amount_ceiling: Decimal,

    /// Lines whose name contains one of these words are skipped.
    pub ignore_words: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            amount_ceiling: Decimal::from(10_000),
            ignore_words: Vec::new(),
        }
    }
}

/// Date resolution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    /// Recognised formats, highest priority first.
    pub formats: Vec<DateFormat>,

    /// Date used when the text has none (None = today).
    pub default_date: Option<NaiveDate>,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            formats: DateFormat::default_priority().to_vec(),
            default_date: None,
        }
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Workbook file location.
    pub path: PathBuf,

    /// Copy the existing workbook aside before every write.
    pub create_backup: bool,

    /// Number of backups kept per workbook (0 = unlimited).
    pub max_backups: usize,

    /// How long a writer waits for the store lock, in milliseconds.
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("receipts.xlsx"),
            create_backup: true,
            max_backups: 10,
            lock_timeout_ms: 10_000,
        }
    }
}

impl StoreConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl RcptConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| RcptError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| RcptError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: RcptConfig =
            serde_json::from_str(r#"{ "extraction": { "ignore_words": ["total"] } }"#).unwrap();

        assert_eq!(config.extraction.ignore_words, vec!["total".to_string()]);
        assert_eq!(config.extraction.amount_ceiling, Decimal::from(10_000));
        assert_eq!(config.dates.formats, DateFormat::default_priority().to_vec());
        assert_eq!(config.store.path, PathBuf::from("receipts.xlsx"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = RcptConfig::default();
        config.dates.default_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        config.store.max_backups = 3;
        config.save(&path).unwrap();

        let loaded = RcptConfig::from_file(&path).unwrap();
        assert_eq!(loaded.dates.default_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(loaded.store.max_backups, 3);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = RcptConfig::from_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, RcptError::Io(_)));

        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "store": { "max_backups": "many" } }"#).unwrap();
        match RcptConfig::from_file(&path).unwrap_err() {
            RcptError::Config(message) => assert!(message.contains("config.json"), "{message}"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
