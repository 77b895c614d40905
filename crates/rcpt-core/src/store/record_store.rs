//! Date-partitioned receipt store backed by a single workbook file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::backup;
use super::lock::StoreLock;
use super::workbook::{Sheet, UpsertAction, Workbook};
use super::xlsx;
use crate::error::StoreError;
use crate::models::config::StoreConfig;
use crate::models::receipt::ReceiptRecord;

/// Summary of one completed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    pub sheet_name: String,
    pub action: UpsertAction,
    /// Item rows written, excluding TOTAL.
    pub rows: usize,
    pub total: Decimal,
    /// Copy of the previous workbook, when one was taken.
    pub backup: Option<PathBuf>,
}

/// Persistent store with one partition (sheet) per receipt date.
///
/// The store is an `.xlsx` workbook. Each [`write`](Self::write) is a single
/// transaction under an exclusive advisory lock on a sidecar file: read the
/// whole workbook, replace or append the record's partition, write a
/// temporary file next to the target, fsync and rename. Other sheets are
/// written back unchanged.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    config: StoreConfig,
}

impl RecordStore {
    /// Store at `path`. Nothing is touched on disk until the first write.
    pub fn open(path: impl Into<PathBuf>, config: StoreConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// Store at `config.path`.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::open(config.path.clone(), config.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sidecar lock file, `<file>.lock`.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Current workbook; empty when the file does not exist yet.
    pub fn read(&self) -> Result<Workbook, StoreError> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Workbook::default()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        if content.is_empty() {
            return Ok(Workbook::default());
        }

        xlsx::decode(&self.path, content)
    }

    /// The partition for `date`, if stored.
    pub fn partition(&self, date: NaiveDate) -> Result<Option<Sheet>, StoreError> {
        Ok(self.read()?.partition(date).cloned())
    }

    /// Every stored record in file order, TOTAL rows excluded.
    pub fn records(&self) -> Result<Vec<ReceiptRecord>, StoreError> {
        Ok(self
            .read()?
            .partitions()
            .filter_map(|(_, sheet)| sheet.to_record())
            .collect())
    }

    /// Create or replace the partition for `record.date`.
    ///
    /// An empty record still produces a partition holding only `TOTAL 0`.
    /// A corrupt existing workbook fails the write and is left as is.
    pub fn write(&self, record: &ReceiptRecord) -> Result<WriteOutcome, StoreError> {
        let parent = self.parent_dir();
        fs::create_dir_all(&parent).map_err(|e| StoreError::io(&parent, e))?;

        let _lock = StoreLock::acquire(&self.lock_path(), self.config.lock_timeout())?;

        let mut workbook = self.read()?;

        let backup = if self.config.create_backup {
            match backup::create_backup(&self.path, self.config.max_backups) {
                Ok(path) => path,
                Err(e) => {
                    warn!("Failed to back up {}: {}", self.path.display(), e);
                    None
                }
            }
        } else {
            None
        };

        let sheet = Sheet::from_record(record);
        let sheet_name = sheet.name.clone();
        let action = workbook.upsert(sheet);

        self.persist(&workbook, &parent)?;

        info!(
            "{} sheet '{}' in {} ({} items, total {})",
            match action {
                UpsertAction::Created => "Created",
                UpsertAction::Replaced => "Replaced",
            },
            sheet_name,
            self.path.display(),
            record.item_count(),
            record.total()
        );

        Ok(WriteOutcome {
            sheet_name,
            action,
            rows: record.item_count(),
            total: record.total(),
            backup,
        })
    }

    fn persist(&self, workbook: &Workbook, parent: &Path) -> Result<(), StoreError> {
        let bytes = xlsx::encode(&self.path, workbook)?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| StoreError::io(parent, e))?;
        tmp.write_all(&bytes).map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(tmp.path(), e))?;

        tmp.persist(&self.path).map_err(|e| StoreError::io(&self.path, e.error))?;

        debug!("Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
