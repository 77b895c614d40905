//! Receipt extraction module.

mod extractor;
mod pipeline;
pub mod rules;

pub use extractor::{Items, Outcomes, ParsedLine, ReceiptExtractor};
pub use pipeline::{DateSource, ExtractionResult, ReceiptPipeline};

use chrono::NaiveDate;

/// Trait for turning OCR text into a receipt record.
pub trait ReceiptParser {
    /// Extract the receipt date and line items from text.
    ///
    /// `default_date` is used when the text carries no recognisable date.
    fn parse(&self, text: &str, default_date: NaiveDate) -> ExtractionResult;
}
