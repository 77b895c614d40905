//! Receipt data models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Calendar date a receipt belongs to.
pub type ReceiptDate = NaiveDate;

/// One parsed (name, amount) pair taken from a single line of receipt text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Item label, trimmed with internal whitespace collapsed.
    pub name: String,

    /// Non-negative amount with the scale it was written with.
    pub amount: Decimal,
}

impl LineItem {
    pub fn new(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// The line items of one receipt together with its resolved date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    /// Receipt date; decides which partition the record is written to.
    pub date: ReceiptDate,

    /// Items in original line order.
    pub items: Vec<LineItem>,
}

impl ReceiptRecord {
    pub fn new(date: ReceiptDate, items: Vec<LineItem>) -> Self {
        Self { date, items }
    }

    /// Exact sum of all item amounts.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(|item| item.amount).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_total_keeps_exact_scale() {
        let record = ReceiptRecord::new(
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            vec![
                LineItem::new("Coffee", Decimal::from_str("4.50").unwrap()),
                LineItem::new("Bagel", Decimal::from_str("3.25").unwrap()),
            ],
        );

        assert_eq!(record.total().to_string(), "7.75");
        assert_eq!(record.item_count(), 2);
    }

    #[test]
    fn test_empty_record_totals_zero() {
        let record = ReceiptRecord::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), vec![]);
        assert!(record.is_empty());
        assert_eq!(record.total(), Decimal::ZERO);
    }
}
