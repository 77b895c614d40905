//! Amount parsing for receipt lines.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::AMOUNT_BODY;
use crate::error::AmountError;

/// Currency markers accepted in front of an amount, longest first.
const CURRENCY_MARKERS: [&str; 3] = ["US$", "USD", "$"];

/// Converts a raw amount candidate into a validated decimal.
#[derive(Debug, Clone)]
pub struct AmountParser {
    ceiling: Decimal,
}

impl AmountParser {
    pub fn new(ceiling: Decimal) -> Self {
        Self { ceiling }
    }

    /// Parse a candidate such as `$1,234.50`, `USD 12` or `4.5`.
    ///
    /// The scale of the source text is kept (`4.50` stays `4.50`). Signs,
    /// malformed grouping and more than two decimals are format errors;
    /// values above the ceiling are range errors.
    pub fn parse(&self, raw: &str) -> Result<Decimal, AmountError> {
        let body = strip_currency(raw.trim()).trim_start();

        if !AMOUNT_BODY.is_match(body) {
            return Err(format_error(raw));
        }

        let value = Decimal::from_str(&body.replace(',', "")).map_err(|_| format_error(raw))?;

        if value > self.ceiling {
            return Err(AmountError::Range {
                value,
                ceiling: self.ceiling,
            });
        }

        Ok(value)
    }
}

impl Default for AmountParser {
    fn default() -> Self {
        Self::new(Decimal::from(10_000))
    }
}

fn strip_currency(s: &str) -> &str {
    CURRENCY_MARKERS
        .iter()
        .find_map(|marker| s.strip_prefix(marker))
        .unwrap_or(s)
}

fn format_error(raw: &str) -> AmountError {
    AmountError::Format {
        value: raw.to_string(),
    }
}

/// Format amount in US style ($1,234.56).
pub fn format_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount);
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    // Add thousand separators
    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(*c);
    }

    format!("${}.{}", formatted, decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain_and_marked() {
        let parser = AmountParser::default();

        assert_eq!(parser.parse("4.50").unwrap(), dec("4.50"));
        assert_eq!(parser.parse("$4.50").unwrap(), dec("4.50"));
        assert_eq!(parser.parse("$ 4.50").unwrap(), dec("4.50"));
        assert_eq!(parser.parse("USD 12").unwrap(), dec("12"));
        assert_eq!(parser.parse("US$7.5").unwrap(), dec("7.5"));
    }

    #[test]
    fn test_parse_keeps_source_scale() {
        let parser = AmountParser::default();

        assert_eq!(parser.parse("4.50").unwrap().to_string(), "4.50");
        assert_eq!(parser.parse("4.5").unwrap().to_string(), "4.5");
        assert_eq!(parser.parse("4").unwrap().to_string(), "4");
    }

    #[test]
    fn test_parse_thousands_separators() {
        let parser = AmountParser::default();

        assert_eq!(parser.parse("$1,234.56").unwrap(), dec("1234.56"));
        assert_eq!(parser.parse("1234.56").unwrap(), dec("1234.56"));
        assert!(matches!(parser.parse("12,34"), Err(AmountError::Format { .. })));
    }

    #[test]
    fn test_rejects_malformed() {
        let parser = AmountParser::default();

        for raw in ["", "$", "-4.50", "4.567", "abc", "4.50.1", "4,50"] {
            assert!(
                matches!(parser.parse(raw), Err(AmountError::Format { .. })),
                "expected format error for {raw:?}"
            );
        }
    }

    #[test]
    fn test_rejects_above_ceiling() {
        let parser = AmountParser::new(dec("100"));

        assert_eq!(parser.parse("100").unwrap(), dec("100"));
        assert_eq!(
            parser.parse("100.01"),
            Err(AmountError::Range {
                value: dec("100.01"),
                ceiling: dec("100"),
            })
        );
    }

    #[test]
    fn test_long_digit_run_is_out_of_range() {
        let parser = AmountParser::default();
        assert!(matches!(
            parser.parse("2024031599"),
            Err(AmountError::Range { .. })
        ));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec("1234.56")), "$1,234.56");
        assert_eq!(format_amount(dec("7.75")), "$7.75");
        assert_eq!(format_amount(dec("12345678.9")), "$12,345,678.90");
    }
}
