//! Single-line item extraction.

use std::fmt;

use super::amounts::AmountParser;
use super::patterns::AMOUNT_TOKEN;
use crate::error::AmountError;
use crate::models::receipt::LineItem;

/// Why a line produced no item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Empty or whitespace-only line.
    Blank,
    /// No numeric-looking token on the line.
    NoAmount,
    /// The right-most amount has no label in front of it.
    EmptyName,
    /// The right-most numeric token was rejected by the amount parser.
    InvalidAmount(AmountError),
    /// The label contains a configured ignore word.
    IgnoredKeyword(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => f.write_str("blank line"),
            Self::NoAmount => f.write_str("no amount"),
            Self::EmptyName => f.write_str("amount without a name"),
            Self::InvalidAmount(err) => write!(f, "{}", err),
            Self::IgnoredKeyword(word) => write!(f, "ignored keyword {:?}", word),
        }
    }
}

/// Result of parsing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Matched(LineItem),
    Skipped(SkipReason),
}

impl LineOutcome {
    pub fn item(&self) -> Option<&LineItem> {
        match self {
            Self::Matched(item) => Some(item),
            Self::Skipped(_) => None,
        }
    }

    pub fn into_item(self) -> Option<LineItem> {
        match self {
            Self::Matched(item) => Some(item),
            Self::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Self::Matched(_) => None,
            Self::Skipped(reason) => Some(reason),
        }
    }
}

/// Extracts at most one (name, amount) pair from a line of receipt text.
#[derive(Debug, Clone, Default)]
pub struct LineParser {
    amounts: AmountParser,
    /// Lowercased.
    ignore_words: Vec<String>,
}

impl LineParser {
    pub fn new(amounts: AmountParser) -> Self {
        Self {
            amounts,
            ignore_words: Vec::new(),
        }
    }

    /// Skip lines whose name contains any of these words (case-insensitive).
    pub fn with_ignore_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignore_words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        self
    }

    /// Parse one line.
    ///
    /// Only the right-most numeric token is considered. A token must stand
    /// on its own: whitespace (or a leading currency marker) before it, and
    /// after it whitespace, end of line, punctuation or a one-letter tax
    /// flag such as `2.49F`. Punctuation that joins it to more digits makes
    /// it part of a date, time or phone number, so `2024-03-15 08:12` carries
    /// no amount. If the token fails validation the line is skipped, other
    /// tokens are never retried.
    pub fn parse(&self, line: &str) -> LineOutcome {
        if line.trim().is_empty() {
            return LineOutcome::Skipped(SkipReason::Blank);
        }

        let Some(token) = AMOUNT_TOKEN
            .find_iter(line)
            .filter(|m| is_delimited(line, m.start(), m.end()))
            .last()
        else {
            return LineOutcome::Skipped(SkipReason::NoAmount);
        };

        let amount = match self.amounts.parse(token.as_str()) {
            Ok(amount) => amount,
            Err(err) => return LineOutcome::Skipped(SkipReason::InvalidAmount(err)),
        };

        let name = collapse_whitespace(&line[..token.start()]);
        if name.is_empty() {
            return LineOutcome::Skipped(SkipReason::EmptyName);
        }

        if let Some(word) = self.ignored_word(&name) {
            return LineOutcome::Skipped(SkipReason::IgnoredKeyword(word.to_string()));
        }

        LineOutcome::Matched(LineItem::new(name, amount))
    }

    fn ignored_word(&self, name: &str) -> Option<&str> {
        if self.ignore_words.is_empty() {
            return None;
        }

        let lowered = name.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        self.ignore_words
            .iter()
            .find(|ignored| words.contains(&ignored.as_str()))
            .map(String::as_str)
    }
}

fn is_delimited(line: &str, start: usize, end: usize) -> bool {
    let token = &line[start..end];
    let previous = line[..start].chars().next_back();

    let before_ok = match token.chars().next() {
        Some('$') => true,
        // `US$` / `USD` only count as a marker when they start a word.
        Some('U') => previous.is_none_or(|c| !c.is_alphanumeric()),
        _ => previous.is_none_or(char::is_whitespace),
    };

    let mut rest = line[end..].chars();
    let after_ok = match rest.next() {
        None => true,
        Some(c) if c.is_whitespace() => true,
        Some(c) if c.is_ascii_uppercase() => rest.next().is_none_or(|n| !n.is_alphanumeric()),
        Some(c) if c.is_alphanumeric() => false,
        Some(_) => !rest.next().is_some_and(|n| n.is_ascii_digit()),
    };

    before_ok && after_ok
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
