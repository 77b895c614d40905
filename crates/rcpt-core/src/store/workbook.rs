//! Workbook model: partition sheets of Date/Name/Category/Amount rows, plus
//! any other sheets found in the file, kept cell by cell.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::receipt::{LineItem, ReceiptRecord};

/// Name of the trailing total row in every partition.
pub const TOTAL_LABEL: &str = "TOTAL";

/// Column headers in output order.
pub const COLUMNS: [&str; 4] = ["Date", "Name", "Category", "Amount"];

const SHEET_PREFIX: &str = "Receipt ";

/// Sheet name for the partition of `date`.
pub fn sheet_name(date: NaiveDate) -> String {
    format!("{}{}", SHEET_PREFIX, date.format("%Y-%m-%d"))
}

/// Date encoded in a partition sheet name, if it is one.
pub fn partition_date(name: &str) -> Option<NaiveDate> {
    let rest = name.strip_prefix(SHEET_PREFIX)?;
    NaiveDate::parse_from_str(rest, "%Y-%m-%d").ok()
}

/// One row of a partition sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub date: NaiveDate,
    pub name: String,
    /// Reserved, always empty when written.
    pub category: String,
    pub amount: Decimal,
}

impl Row {
    pub fn new(date: NaiveDate, name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date,
            name: name.into(),
            category: String::new(),
            amount,
        }
    }

    pub fn is_total(&self) -> bool {
        self.name == TOTAL_LABEL
    }
}

/// A partition sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

impl Sheet {
    /// Build the partition for a record: one row per item plus the TOTAL row.
    pub fn from_record(record: &ReceiptRecord) -> Self {
        let mut rows: Vec<Row> = record
            .items
            .iter()
            .map(|item| Row::new(record.date, item.name.clone(), item.amount))
            .collect();
        rows.push(Row::new(record.date, TOTAL_LABEL, record.total()));

        Self {
            name: sheet_name(record.date),
            rows,
        }
    }

    /// Partition date, if this sheet is a partition.
    pub fn date(&self) -> Option<NaiveDate> {
        partition_date(&self.name)
    }

    /// Rows before the trailing TOTAL row.
    pub fn item_rows(&self) -> &[Row] {
        match self.rows.split_last() {
            Some((last, rest)) if last.is_total() => rest,
            _ => &self.rows,
        }
    }

    /// Amount of the trailing TOTAL row.
    pub fn total(&self) -> Option<Decimal> {
        self.rows.last().filter(|row| row.is_total()).map(|row| row.amount)
    }

    /// Whether the TOTAL row equals the sum of the item rows.
    pub fn is_consistent(&self) -> bool {
        let sum: Decimal = self.item_rows().iter().map(|row| row.amount).sum();
        self.total() == Some(sum)
    }

    /// Rebuild the record stored in this partition.
    pub fn to_record(&self) -> Option<ReceiptRecord> {
        let date = self.date()?;
        let items = self
            .item_rows()
            .iter()
            .map(|row| LineItem::new(row.name.clone(), row.amount))
            .collect();
        Some(ReceiptRecord::new(date, items))
    }
}

/// What [`Workbook::upsert`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertAction {
    Created,
    Replaced,
}

/// Value of a single cell in a sheet that is not a partition.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

/// A non-empty cell at a zero-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub row: u32,
    pub col: u16,
    pub value: CellValue,
}

/// A sheet the store does not own. Written back as it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct OtherSheet {
    pub name: String,
    pub cells: Vec<Cell>,
}

/// Any sheet of the workbook, in file order.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkbookSheet {
    Partition(Sheet),
    Other(OtherSheet),
}

impl WorkbookSheet {
    pub fn name(&self) -> &str {
        match self {
            Self::Partition(sheet) => &sheet.name,
            Self::Other(sheet) => &sheet.name,
        }
    }
}

/// The whole store file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<WorkbookSheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<WorkbookSheet>) -> Self {
        Self { sheets }
    }

    pub fn sheets(&self) -> &[WorkbookSheet] {
        &self.sheets
    }

    /// Sheet names in file order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(WorkbookSheet::name)
    }

    pub fn partition(&self, date: NaiveDate) -> Option<&Sheet> {
        let name = sheet_name(date);
        self.partitions()
            .find(|(_, sheet)| sheet.name == name)
            .map(|(_, sheet)| sheet)
    }

    /// Replace the sheet with the same name in place, or append it.
    pub fn upsert(&mut self, sheet: Sheet) -> UpsertAction {
        match self.sheets.iter_mut().find(|existing| existing.name() == sheet.name) {
            Some(existing) => {
                *existing = WorkbookSheet::Partition(sheet);
                UpsertAction::Replaced
            }
            None => {
                self.sheets.push(WorkbookSheet::Partition(sheet));
                UpsertAction::Created
            }
        }
    }

    /// Partition sheets in file order with their dates.
    pub fn partitions(&self) -> impl Iterator<Item = (NaiveDate, &Sheet)> {
        self.sheets.iter().filter_map(|entry| match entry {
            WorkbookSheet::Partition(sheet) => sheet.date().map(|date| (date, sheet)),
            WorkbookSheet::Other(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(date: NaiveDate, items: &[(&str, &str)]) -> ReceiptRecord {
        ReceiptRecord::new(
            date,
            items.iter().map(|(n, a)| LineItem::new(*n, dec(a))).collect(),
        )
    }

    #[test]
    fn test_sheet_name_round_trip() {
        assert_eq!(sheet_name(ymd(2024, 1, 1)), "Receipt 2024-01-01");
        assert_eq!(partition_date("Receipt 2024-01-01"), Some(ymd(2024, 1, 1)));
        assert_eq!(partition_date("Summary"), None);
        assert_eq!(partition_date("Receipt 2024-13-01"), None);
    }

    #[test]
    fn test_from_record_appends_total() {
        let items = [("Coffee", "4.50"), ("Bagel", "3.25")];
        let sheet = Sheet::from_record(&record(ymd(2024, 1, 1), &items));

        assert_eq!(sheet.name, "Receipt 2024-01-01");
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[2], Row::new(ymd(2024, 1, 1), "TOTAL", dec("7.75")));
        assert_eq!(sheet.item_rows().len(), 2);
        assert!(sheet.rows.iter().all(|row| row.category.is_empty()));
        assert!(sheet.is_consistent());
    }

    #[test]
    fn test_empty_record_has_only_total() {
        let sheet = Sheet::from_record(&record(ymd(2024, 1, 1), &[]));

        assert_eq!(sheet.rows, vec![Row::new(ymd(2024, 1, 1), "TOTAL", Decimal::ZERO)]);
        assert!(sheet.item_rows().is_empty());
        assert!(sheet.is_consistent());
    }

    #[test]
    fn test_inconsistent_total_is_detected() {
        let mut sheet = Sheet::from_record(&record(ymd(2024, 1, 1), &[("Tea", "2.00")]));
        sheet.rows[1].amount = dec("3.00");
        assert!(!sheet.is_consistent());
    }

    #[test]
    fn test_to_record() {
        let original = record(ymd(2024, 2, 1), &[("Tea", "2.00"), ("Scone", "3.10")]);
        let sheet = Sheet::from_record(&original);

        assert_eq!(sheet.to_record(), Some(original));
    }

    #[test]
    fn test_upsert_replaces_in_place_and_appends() {
        let mut workbook = Workbook::default();
        let d1 = ymd(2024, 1, 1);
        let d2 = ymd(2024, 2, 1);

        assert_eq!(
            workbook.upsert(Sheet::from_record(&record(d1, &[("A", "1")]))),
            UpsertAction::Created
        );
        assert_eq!(
            workbook.upsert(Sheet::from_record(&record(d2, &[("B", "2")]))),
            UpsertAction::Created
        );
        assert_eq!(
            workbook.upsert(Sheet::from_record(&record(d1, &[("C", "3")]))),
            UpsertAction::Replaced
        );

        let names: Vec<&str> = workbook.sheet_names().collect();
        assert_eq!(names, vec!["Receipt 2024-01-01", "Receipt 2024-02-01"]);
        assert_eq!(workbook.partition(d1).unwrap().rows[0].name, "C");
    }

    #[test]
    fn test_other_sheets_keep_their_place() {
        let notes = WorkbookSheet::Other(OtherSheet {
            name: "Notes".to_string(),
            cells: vec![Cell {
                row: 0,
                col: 0,
                value: CellValue::Text("keep me".to_string()),
            }],
        });
        let d1 = ymd(2024, 1, 1);
        let mut workbook = Workbook::new(vec![
            WorkbookSheet::Partition(Sheet::from_record(&record(d1, &[("A", "1")]))),
            notes.clone(),
        ]);

        workbook.upsert(Sheet::from_record(&record(d1, &[("B", "2")])));
        workbook.upsert(Sheet::from_record(&record(ymd(2024, 2, 1), &[("C", "3")])));

        let names: Vec<&str> = workbook.sheet_names().collect();
        assert_eq!(names, vec!["Receipt 2024-01-01", "Notes", "Receipt 2024-02-01"]);
        assert_eq!(workbook.sheets()[1], notes);

        let dates: Vec<NaiveDate> = workbook.partitions().map(|(d, _)| d).collect();
        assert_eq!(dates, vec![d1, ymd(2024, 2, 1)]);
    }
}
