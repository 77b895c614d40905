//! Line-by-line item extraction over a whole receipt.

use std::iter::{Enumerate, FusedIterator};
use std::str::Lines;

use tracing::debug;

use super::rules::{AmountParser, LineOutcome, LineParser, SkipReason};
use crate::models::config::ExtractionConfig;
use crate::models::receipt::LineItem;

/// One physical line and what the line parser made of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// 1-based line number.
    pub line_number: usize,
    pub raw: String,
    pub outcome: LineOutcome,
}

/// Applies a [`LineParser`] to every line of OCR text.
#[derive(Debug, Clone, Default)]
pub struct ReceiptExtractor {
    parser: LineParser,
}

impl ReceiptExtractor {
    pub fn new(parser: LineParser) -> Self {
        Self { parser }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        let parser = LineParser::new(AmountParser::new(config.amount_ceiling))
            .with_ignore_words(&config.ignore_words);
        Self::new(parser)
    }

    /// Matched items in line order. Calling `items` again starts over.
    pub fn items<'a>(&'a self, text: &'a str) -> Items<'a> {
        Items {
            outcomes: self.outcomes(text),
        }
    }

    /// Every line with its outcome, including skipped ones.
    pub fn outcomes<'a>(&'a self, text: &'a str) -> Outcomes<'a> {
        Outcomes {
            parser: &self.parser,
            lines: text.lines().enumerate(),
        }
    }
}

/// Iterator over [`ParsedLine`]s.
#[derive(Debug, Clone)]
pub struct Outcomes<'a> {
    parser: &'a LineParser,
    lines: Enumerate<Lines<'a>>,
}

impl Iterator for Outcomes<'_> {
    type Item = ParsedLine;

    fn next(&mut self) -> Option<Self::Item> {
        let (index, raw) = self.lines.next()?;
        let outcome = self.parser.parse(raw);

        if let LineOutcome::Skipped(reason) = &outcome {
            if *reason != SkipReason::Blank {
                debug!(line = index + 1, text = raw, %reason, "Skipped receipt line");
            }
        }

        Some(ParsedLine {
            line_number: index + 1,
            raw: raw.to_string(),
            outcome,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lines.size_hint()
    }
}

impl FusedIterator for Outcomes<'_> {}

/// Iterator over matched [`LineItem`]s.
#[derive(Debug, Clone)]
pub struct Items<'a> {
    outcomes: Outcomes<'a>,
}

impl Iterator for Items<'_> {
    type Item = LineItem;

    fn next(&mut self) -> Option<Self::Item> {
        self.outcomes.find_map(|line| line.outcome.into_item())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.outcomes.size_hint().1)
    }
}

impl FusedIterator for Items<'_> {}
