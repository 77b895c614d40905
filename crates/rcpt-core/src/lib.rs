//! Core library for receipt OCR post-processing.
//!
//! This crate provides:
//! - Line item extraction from noisy OCR text (names, validated amounts)
//! - Receipt date resolution with a configurable format priority
//! - A date-partitioned workbook store that never loses other partitions

pub mod error;
pub mod models;
pub mod receipt;
pub mod store;

pub use error::{AmountError, RcptError, Result, StoreError};
pub use models::{LineItem, RcptConfig, ReceiptDate, ReceiptRecord};
pub use receipt::rules::{DateFormat, LineOutcome, SkipReason};
pub use receipt::{DateSource, ExtractionResult, ReceiptExtractor, ReceiptParser, ReceiptPipeline};
pub use store::{RecordStore, WriteOutcome};
