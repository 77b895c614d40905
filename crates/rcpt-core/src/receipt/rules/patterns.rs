//! Common regex patterns for receipt text extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Anything that looks like an amount, with an optional currency marker.
    // Validation happens in the amount parser, this only finds candidates.
    // Letter markers need a word boundary so `BONUS$4.50` keeps its name.
    pub static ref AMOUNT_TOKEN: Regex = Regex::new(
        r"(?:(?:\bUS\$|\bUSD|\$)\s*)?\d[\d,]*(?:\.\d+)?"
    ).unwrap();

    // Numeric body of an amount once the currency marker is stripped:
    // plain digits or comma-grouped thousands, then 0-2 decimals.
    pub static ref AMOUNT_BODY: Regex = Regex::new(
        r"^(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?$"
    ).unwrap();

    // Date layouts. Digit-run boundaries are checked by the resolver since
    // the regex crate has no lookaround.
    pub static ref DATE_YMD_DASH: Regex = Regex::new(
        r"(\d{4})-(\d{1,2})-(\d{1,2})"
    ).unwrap();

    pub static ref DATE_YMD_SLASH: Regex = Regex::new(
        r"(\d{4})/(\d{1,2})/(\d{1,2})"
    ).unwrap();

    // Shared by month-first and day-first layouts.
    pub static ref DATE_NUMERIC_SLASH: Regex = Regex::new(
        r"(\d{1,2})/(\d{1,2})/(\d{4})"
    ).unwrap();

    pub static ref DATE_NUMERIC_DASH: Regex = Regex::new(
        r"(\d{1,2})-(\d{1,2})-(\d{4})"
    ).unwrap();

    pub static ref DATE_NUMERIC_DOT: Regex = Regex::new(
        r"(\d{1,2})\.(\d{1,2})\.(\d{4})"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_token_takes_marker_with_digits() {
        let found: Vec<&str> = AMOUNT_TOKEN
            .find_iter("Coffee  $ 1,234.50 x2")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["$ 1,234.50", "2"]);

        let found: Vec<&str> = AMOUNT_TOKEN
            .find_iter("BONUS$4.50 USD 2")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["$4.50", "USD 2"]);
    }

    #[test]
    fn test_amount_body() {
        assert!(AMOUNT_BODY.is_match("4"));
        assert!(AMOUNT_BODY.is_match("4.5"));
        assert!(AMOUNT_BODY.is_match("1,234.56"));
        assert!(!AMOUNT_BODY.is_match("12,34"));
        assert!(!AMOUNT_BODY.is_match("4.567"));
        assert!(!AMOUNT_BODY.is_match("-4.50"));
    }
}
