//! Export command - write one stored partition as CSV.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Args;
use console::style;

use rcpt_core::store::{sheet_name, Sheet, COLUMNS};

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Receipt date of the partition (YYYY-MM-DD)
    #[arg(short, long, required = true)]
    date: NaiveDate,

    /// Workbook to read (default: store.path from config)
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: ExportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let store = super::open_store(args.store.as_deref(), &config);

    let Some(sheet) = store.partition(args.date)? else {
        anyhow::bail!(
            "No sheet '{}' in {}",
            sheet_name(args.date),
            store.path().display()
        );
    };

    let data = sheet_to_csv(&sheet)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &data)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{}", data);
    }

    Ok(())
}

/// Sheet rows as CSV with the workbook column headers.
pub fn sheet_to_csv(sheet: &Sheet) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(COLUMNS)?;

    for row in &sheet.rows {
        wtr.write_record([
            row.date.to_string().as_str(),
            row.name.as_str(),
            row.category.as_str(),
            row.amount.to_string().as_str(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}
