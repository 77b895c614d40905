//! Reading and writing the workbook as an `.xlsx` file.
//!
//! Partition sheets hold a `Date, Name, Category, Amount` header followed by
//! one row per item and the TOTAL row. Dates are written as `YYYY-MM-DD`
//! text and amounts as number cells with two decimals. Every other sheet is
//! carried through cell by cell.

use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use calamine::{Data, Range, Reader, Xlsx};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_xlsxwriter::{Format, Worksheet, XlsxError};

use super::workbook::{
    partition_date, Cell, CellValue, OtherSheet, Row, Sheet, Workbook, WorkbookSheet, COLUMNS,
};
use crate::error::StoreError;

const DATE_FORMAT: &str = "%Y-%m-%d";

static EMPTY_CELL: Data = Data::Empty;

/// 1-based row number and reason for a partition row that does not decode.
type RowError = (u32, String);

/// Decode the bytes of an `.xlsx` file.
pub(crate) fn decode(path: &Path, content: Vec<u8>) -> Result<Workbook, StoreError> {
    let corrupt = |source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    };

    let mut xlsx = Xlsx::new(Cursor::new(content)).map_err(corrupt)?;
    let mut sheets = Vec::new();

    for name in xlsx.sheet_names() {
        let range = xlsx.worksheet_range(&name).map_err(corrupt)?;

        let sheet = if partition_date(&name).is_some() {
            let rows = decode_rows(&range).map_err(|(row, reason)| StoreError::Malformed {
                path: path.to_path_buf(),
                sheet: name.clone(),
                row,
                reason,
            })?;
            WorkbookSheet::Partition(Sheet { name, rows })
        } else {
            WorkbookSheet::Other(decode_other(name, &range))
        };
        sheets.push(sheet);
    }

    Ok(Workbook::new(sheets))
}

/// Encode the workbook as `.xlsx` bytes.
pub(crate) fn encode(path: &Path, workbook: &Workbook) -> Result<Vec<u8>, StoreError> {
    let failed = |source| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    };

    let mut book = rust_xlsxwriter::Workbook::new();
    for entry in workbook.sheets() {
        let worksheet = book.add_worksheet();
        worksheet.set_name(entry.name()).map_err(failed)?;

        let written = match entry {
            WorkbookSheet::Partition(sheet) => write_partition(worksheet, sheet),
            WorkbookSheet::Other(sheet) => write_other(worksheet, sheet),
        };
        written.map_err(failed)?;
    }

    book.save_to_buffer().map_err(failed)
}

fn decode_rows(range: &Range<Data>) -> Result<Vec<Row>, RowError> {
    let mut lines = range.rows();

    let header: Vec<String> = lines
        .next()
        .map(|cells| {
            cells
                .iter()
                .take(COLUMNS.len())
                .map(|cell| cell_text(cell).unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();
    if range.start() != Some((0, 0)) || header != COLUMNS {
        return Err((1, format!("expected header {}", COLUMNS.join(", "))));
    }

    let mut rows = Vec::new();
    for (index, cells) in lines.enumerate() {
        let number = index as u32 + 2;
        if cells.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let cell = |col: usize| cells.get(col).unwrap_or(&EMPTY_CELL);

        let date = cell_text(cell(0))
            .and_then(|text| NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok())
            .ok_or_else(|| (number, "Date is not YYYY-MM-DD".to_string()))?;
        let name = cell_text(cell(1))
            .filter(|text| !text.is_empty())
            .ok_or_else(|| (number, "Name is empty".to_string()))?;
        let category = cell_text(cell(2)).unwrap_or_default();
        let amount = cell_amount(cell(3)).ok_or_else(|| (number, "Amount is not a number".to_string()))?;

        rows.push(Row {
            date,
            name,
            category,
            amount,
        });
    }

    Ok(rows)
}

fn decode_other(name: String, range: &Range<Data>) -> OtherSheet {
    let (top, left) = range.start().unwrap_or_default();

    let cells = range
        .cells()
        .filter_map(|(row, col, data)| {
            let value = match data {
                Data::Empty | Data::Error(_) => return None,
                Data::String(text) => CellValue::Text(text.clone()),
                Data::Float(number) => CellValue::Number(*number),
                Data::Int(number) => CellValue::Number(*number as f64),
                Data::Bool(flag) => CellValue::Bool(*flag),
                other => CellValue::Text(other.to_string()),
            };
            Some(Cell {
                row: top + row as u32,
                col: (left as usize + col) as u16,
                value,
            })
        })
        .collect();

    OtherSheet { name, cells }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn cell_amount(cell: &Data) -> Option<Decimal> {
    let value = match cell {
        Data::Float(number) => Decimal::from_f64(*number)?,
        Data::Int(number) => Decimal::from(*number),
        Data::String(text) => Decimal::from_str(text.trim()).ok()?,
        _ => return None,
    };

    // Number cells are binary floats; stored amounts are whole cents.
    let mut value = value.round_dp(2);
    value.rescale(2);
    Some(value)
}

fn write_partition(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<(), XlsxError> {
    let header = Format::new().set_bold();
    let amount = Format::new().set_num_format("0.00");

    for (col, title) in COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header)?;
    }

    for (index, row) in sheet.rows.iter().enumerate() {
        let line = index as u32 + 1;
        worksheet.write_string(line, 0, row.date.format(DATE_FORMAT).to_string())?;
        worksheet.write_string(line, 1, &row.name)?;
        if !row.category.is_empty() {
            worksheet.write_string(line, 2, &row.category)?;
        }
        let value = row.amount.to_f64().unwrap_or_default();
        worksheet.write_number_with_format(line, 3, value, &amount)?;
    }

    worksheet.set_column_width(1, 30)?;
    Ok(())
}

fn write_other(worksheet: &mut Worksheet, sheet: &OtherSheet) -> Result<(), XlsxError> {
    for cell in &sheet.cells {
        match &cell.value {
            CellValue::Text(text) => worksheet.write_string(cell.row, cell.col, text)?,
            CellValue::Number(number) => worksheet.write_number(cell.row, cell.col, *number)?,
            CellValue::Bool(flag) => worksheet.write_boolean(cell.row, cell.col, *flag)?,
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::receipt::{LineItem, ReceiptRecord};
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(date: NaiveDate, items: &[(&str, &str)]) -> ReceiptRecord {
        ReceiptRecord::new(
            date,
            items
                .iter()
                .map(|(n, a)| LineItem::new(*n, Decimal::from_str(a).unwrap()))
                .collect(),
        )
    }

    fn path() -> &'static Path {
        Path::new("receipts.xlsx")
    }

    fn single(record: &ReceiptRecord) -> Workbook {
        let mut workbook = Workbook::default();
        workbook.upsert(Sheet::from_record(record));
        workbook
    }

    #[test]
    fn test_partition_cells_are_typed() {
        let bytes = encode(path(), &single(&record(ymd(2024, 1, 1), &[("Coffee", "4.50")]))).unwrap();

        let mut xlsx = Xlsx::new(Cursor::new(bytes)).unwrap();
        assert_eq!(xlsx.sheet_names(), vec!["Receipt 2024-01-01".to_string()]);

        let range = xlsx.worksheet_range("Receipt 2024-01-01").unwrap();
        let header: Vec<&Data> = range.rows().next().unwrap().iter().collect();
        assert_eq!(
            header,
            vec![
                &Data::String("Date".to_string()),
                &Data::String("Name".to_string()),
                &Data::String("Category".to_string()),
                &Data::String("Amount".to_string()),
            ]
        );

        assert_eq!(range.get_value((1, 0)), Some(&Data::String("2024-01-01".to_string())));
        assert_eq!(range.get_value((1, 1)), Some(&Data::String("Coffee".to_string())));
        assert_eq!(range.get_value((1, 2)), Some(&Data::Empty));
        assert_eq!(range.get_value((1, 3)), Some(&Data::Float(4.5)));
        assert_eq!(range.get_value((2, 1)), Some(&Data::String("TOTAL".to_string())));
        assert_eq!(range.get_value((2, 3)), Some(&Data::Float(4.5)));
    }

    #[test]
    fn test_amounts_come_back_with_cents() {
        let original = record(ymd(2024, 3, 15), &[("Coffee", "4.50"), ("Tea", "2"), ("Bagel", "3.25")]);
        let bytes = encode(path(), &single(&original)).unwrap();
        let workbook = decode(path(), bytes).unwrap();

        let sheet = workbook.partition(original.date).unwrap();
        let amounts: Vec<String> = sheet.rows.iter().map(|row| row.amount.to_string()).collect();
        assert_eq!(amounts, vec!["4.50", "2.00", "3.25", "9.75"]);
        assert!(sheet.is_consistent());
        assert_eq!(sheet.to_record(), Some(original));
    }

    #[test]
    fn test_other_sheets_survive() {
        let notes = OtherSheet {
            name: "Notes".to_string(),
            cells: vec![
                Cell {
                    row: 2,
                    col: 3,
                    value: CellValue::Text("keep me".to_string()),
                },
                Cell {
                    row: 4,
                    col: 0,
                    value: CellValue::Number(3.5),
                },
                Cell {
                    row: 4,
                    col: 1,
                    value: CellValue::Bool(true),
                },
            ],
        };
        let workbook = Workbook::new(vec![
            WorkbookSheet::Other(notes),
            WorkbookSheet::Partition(Sheet::from_record(&record(ymd(2024, 1, 1), &[("Tea", "2.00")]))),
        ]);

        let bytes = encode(path(), &workbook).unwrap();
        assert_eq!(decode(path(), bytes).unwrap(), workbook);
    }

    #[test]
    fn test_not_an_xlsx_is_corrupt() {
        let err = decode(path(), b"not a workbook".to_vec()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn test_bad_partition_row_is_malformed() {
        let mut book = rust_xlsxwriter::Workbook::new();
        let worksheet = book.add_worksheet();
        worksheet.set_name("Receipt 2024-01-01").unwrap();
        for (col, title) in COLUMNS.iter().enumerate() {
            worksheet.write_string(0, col as u16, *title).unwrap();
        }
        worksheet.write_string(1, 0, "2024-01-01").unwrap();
        worksheet.write_string(1, 1, "Tea").unwrap();
        worksheet.write_string(1, 3, "two dollars").unwrap();
        let bytes = book.save_to_buffer().unwrap();

        match decode(path(), bytes).unwrap_err() {
            StoreError::Malformed { sheet, row, .. } => {
                assert_eq!(sheet, "Receipt 2024-01-01");
                assert_eq!(row, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_partition_without_header_is_malformed() {
        let mut book = rust_xlsxwriter::Workbook::new();
        let worksheet = book.add_worksheet();
        worksheet.set_name("Receipt 2024-01-01").unwrap();
        worksheet.write_string(0, 0, "2024-01-01").unwrap();
        worksheet.write_string(0, 1, "Tea").unwrap();
        worksheet.write_number(0, 3, 2.0).unwrap();
        let bytes = book.save_to_buffer().unwrap();

        let err = decode(path(), bytes).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { row: 1, .. }));
    }
}
