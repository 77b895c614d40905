//! Persistent, date-partitioned receipt storage.

pub mod backup;
mod lock;
mod record_store;
pub mod workbook;
mod xlsx;

pub use lock::StoreLock;
pub use record_store::{RecordStore, WriteOutcome};
pub use workbook::{
    partition_date, sheet_name, Cell, CellValue, OtherSheet, Row, Sheet, UpsertAction, Workbook,
    WorkbookSheet, COLUMNS, TOTAL_LABEL,
};
