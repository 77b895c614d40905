//! Receipt pipeline combining item extraction and date resolution.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info};

use super::extractor::{ParsedLine, ReceiptExtractor};
use super::rules::{DateMatch, DateResolver, FieldExtractor, LineOutcome, SkipReason};
use super::ReceiptParser;
use crate::models::config::RcptConfig;
use crate::models::receipt::ReceiptRecord;

/// Where the receipt date came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateSource {
    /// Found in the text.
    Text(DateMatch),
    /// Not found; the caller's default was used.
    Default,
}

/// Result of receipt extraction.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Date and items ready for the record store.
    pub record: ReceiptRecord,
    /// How the date was obtained.
    pub date_source: DateSource,
    /// Non-blank lines that produced no item.
    pub skipped: Vec<ParsedLine>,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Extraction and date resolution for one receipt, no storage.
#[derive(Debug, Clone, Default)]
pub struct ReceiptPipeline {
    extractor: ReceiptExtractor,
    resolver: DateResolver,
}

impl ReceiptPipeline {
    pub fn new(extractor: ReceiptExtractor, resolver: DateResolver) -> Self {
        Self {
            extractor,
            resolver,
        }
    }

    pub fn from_config(config: &RcptConfig) -> Self {
        Self::new(
            ReceiptExtractor::from_config(&config.extraction),
            DateResolver::new(config.dates.formats.iter().copied()),
        )
    }
}

impl ReceiptParser for ReceiptPipeline {
    fn parse(&self, text: &str, default_date: NaiveDate) -> ExtractionResult {
        let start = Instant::now();
        let mut warnings = Vec::new();

        info!("Parsing receipt from {} characters of text", text.len());

        let date_source = match self.resolver.extract(text) {
            Some(found) => DateSource::Text(found),
            None => {
                warnings.push(format!(
                    "Could not find a receipt date, using {}",
                    default_date
                ));
                DateSource::Default
            }
        };
        let date = match &date_source {
            DateSource::Text(found) => found.date,
            DateSource::Default => default_date,
        };

        let mut items = Vec::new();
        let mut skipped = Vec::new();
        for line in self.extractor.outcomes(text) {
            if let LineOutcome::Skipped(reason) = &line.outcome {
                if *reason != SkipReason::Blank {
                    skipped.push(line);
                }
                continue;
            }
            items.extend(line.outcome.into_item());
        }

        if items.is_empty() {
            warnings.push("Could not extract line items".to_string());
        }

        let record = ReceiptRecord::new(date, items);

        debug!(
            "Extracted {} items totalling {} for {} ({} lines skipped)",
            record.item_count(),
            record.total(),
            record.date,
            skipped.len()
        );

        ExtractionResult {
            record,
            date_source,
            skipped,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }
}
