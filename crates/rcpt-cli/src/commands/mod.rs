//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod export;
pub mod process;
pub mod show;

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tracing::debug;

use rcpt_core::models::config::RcptConfig;
use rcpt_core::store::RecordStore;

/// Config file used when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rcpt")
        .join("config.json")
}

/// Load configuration from `--config`, else the default file, else defaults.
///
/// An explicit path that does not exist is an error.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<RcptConfig> {
    if let Some(path) = config_path {
        let path = Path::new(path);
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        debug!("Loading config from {}", path.display());
        return Ok(RcptConfig::from_file(path)?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(RcptConfig::from_file(&default_path)?)
    } else {
        Ok(RcptConfig::default())
    }
}

/// Store at `--store` if given, else the configured path.
pub fn open_store(store: Option<&Path>, config: &RcptConfig) -> RecordStore {
    match store {
        Some(path) => RecordStore::open(path, config.store.clone()),
        None => RecordStore::from_config(&config.store),
    }
}

/// Date used for receipts without one: `--date`, then config, then today.
pub fn fallback_date(arg: Option<NaiveDate>, config: &RcptConfig) -> NaiveDate {
    arg.or(config.dates.default_date)
        .unwrap_or_else(|| Local::now().date_naive())
}
