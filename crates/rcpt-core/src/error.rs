//! Error types for the rcpt-core library.

use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the rcpt library.
#[derive(Error, Debug)]
pub enum RcptError {
    /// Amount parsing error.
    #[error("amount error: {0}")]
    Amount(#[from] AmountError),

    /// Record store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while turning a candidate substring into a monetary amount.
///
/// These never leave the line parser: a failing candidate turns its line into
/// a skipped line carrying the error as the reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The substring is not a non-negative number with at most two decimals.
    #[error("invalid amount format: {value:?}")]
    Format { value: String },

    /// The amount parsed but exceeds the configured ceiling.
    #[error("amount {value} exceeds ceiling {ceiling}")]
    Range { value: Decimal, ceiling: Decimal },
}

/// Errors related to the persistent record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying storage failure (permissions, disk space, missing path).
    #[error("store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The existing file is not a readable `.xlsx` workbook; it is left untouched.
    #[error("workbook at {path} is unreadable: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    /// A partition sheet has a row that is not a valid Date/Name/Category/Amount row.
    #[error("workbook at {path} is unreadable: sheet '{sheet}' row {row}: {reason}")]
    Malformed {
        path: PathBuf,
        sheet: String,
        row: u32,
        reason: String,
    },

    /// The workbook could not be serialised.
    #[error("failed to encode workbook for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    /// Another writer held the store lock for longer than the allowed wait.
    #[error("store lock {path} still held after {waited:?}")]
    LockTimeout { path: PathBuf, waited: Duration },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for the rcpt library.
pub type Result<T> = std::result::Result<T, RcptError>;
