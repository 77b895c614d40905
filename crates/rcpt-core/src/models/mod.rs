//! Data models and configuration.

pub mod config;
pub mod receipt;

pub use config::{DateConfig, ExtractionConfig, RcptConfig, StoreConfig};
pub use receipt::{LineItem, ReceiptDate, ReceiptRecord};
