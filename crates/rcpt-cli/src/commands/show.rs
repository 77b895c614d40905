//! Show command - list stored partitions or print one of them.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use rust_decimal::Decimal;

use rcpt_core::receipt::rules::format_amount;
use rcpt_core::store::{sheet_name, Sheet};

/// Arguments for the show command.
#[derive(Args)]
pub struct ShowArgs {
    /// Workbook to read (default: store.path from config)
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Print the rows of this date's partition (YYYY-MM-DD)
    #[arg(short, long)]
    date: Option<NaiveDate>,
}

pub async fn run(args: ShowArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let store = super::open_store(args.store.as_deref(), &config);
    let workbook = store.read()?;

    if let Some(date) = args.date {
        let Some(sheet) = workbook.partition(date) else {
            anyhow::bail!("No sheet '{}' in {}", sheet_name(date), store.path().display());
        };
        print_sheet(sheet);
        return Ok(());
    }

    let partitions: Vec<_> = workbook.partitions().collect();
    if partitions.is_empty() {
        println!(
            "{} No receipts stored in {}",
            style("ℹ").blue(),
            store.path().display()
        );
        return Ok(());
    }

    println!("{}", style(store.path().display()).bold());
    for (_, sheet) in &partitions {
        let total = sheet.total().map(format_amount).unwrap_or_else(|| "-".to_string());
        let marker = if sheet.is_consistent() {
            String::new()
        } else {
            format!("  {}", style("TOTAL mismatch").red())
        };

        println!(
            "  {}  {:>3} items  {:>12}{}",
            sheet.name,
            sheet.item_rows().len(),
            total,
            marker
        );
    }

    let grand_total: Decimal = partitions
        .iter()
        .filter_map(|(_, sheet)| sheet.total())
        .sum();
    println!(
        "{} {} receipts, {} in total",
        style("✓").green(),
        partitions.len(),
        format_amount(grand_total)
    );

    Ok(())
}

fn print_sheet(sheet: &Sheet) {
    println!("{}", style(&sheet.name).bold());

    let width = sheet
        .rows
        .iter()
        .map(|row| row.name.chars().count())
        .max()
        .unwrap_or(0);

    for row in &sheet.rows {
        let line = format!(
            "  {}  {:<width$}  {:>12}",
            row.date,
            row.name,
            format_amount(row.amount),
            width = width
        );
        if row.is_total() {
            println!("{}", style(line).bold());
        } else {
            println!("{}", line);
        }
    }
}
