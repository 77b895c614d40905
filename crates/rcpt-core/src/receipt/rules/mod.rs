//! Rule-based field extractors for receipt text.

pub mod amounts;
pub mod dates;
pub mod lines;
pub mod patterns;

pub use amounts::{format_amount, AmountParser};
pub use dates::{DateFormat, DateMatch, DateResolver};
pub use lines::{LineOutcome, LineParser, SkipReason};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}
