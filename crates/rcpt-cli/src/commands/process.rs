//! Process command - extract one receipt and write it to the store.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use rcpt_core::models::receipt::LineItem;
use rcpt_core::receipt::rules::format_amount;
use rcpt_core::receipt::{DateSource, ExtractionResult, ReceiptParser, ReceiptPipeline};
use rcpt_core::store::{Sheet, WriteOutcome};

use super::export::sheet_to_csv;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// OCR text file, or "-" for stdin
    #[arg(required = true)]
    input: PathBuf,

    /// Workbook to write to (default: store.path from config)
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Date to use when the receipt has none (YYYY-MM-DD, default: today)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Extract only, do not touch the store
    #[arg(long)]
    dry_run: bool,

    /// Write a TOTAL-only partition when no items were found
    #[arg(long)]
    allow_empty: bool,

    /// List lines that produced no item, with the reason
    #[arg(long)]
    show_skipped: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV rows as written to the store
    Csv,
    /// Plain text summary
    Text,
}

/// JSON view of one processed receipt.
#[derive(Serialize)]
pub struct ReceiptReport<'a> {
    pub date: NaiveDate,
    pub date_source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_text: Option<&'a str>,
    pub items: &'a [LineItem],
    pub total: Decimal,
    pub skipped: Vec<SkippedLine<'a>>,
    pub warnings: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<&'a WriteOutcome>,
}

#[derive(Serialize)]
pub struct SkippedLine<'a> {
    pub line: usize,
    pub text: &'a str,
    pub reason: String,
}

impl<'a> ReceiptReport<'a> {
    pub fn new(result: &'a ExtractionResult, store: Option<&'a WriteOutcome>) -> Self {
        let (date_source, date_text) = match &result.date_source {
            DateSource::Text(found) => ("text", Some(found.source.as_str())),
            DateSource::Default => ("default", None),
        };

        Self {
            date: result.record.date,
            date_source,
            date_text,
            items: &result.record.items,
            total: result.record.total(),
            skipped: result
                .skipped
                .iter()
                .map(|line| SkippedLine {
                    line: line.line_number,
                    text: line.raw.trim(),
                    reason: line
                        .outcome
                        .skip_reason()
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                })
                .collect(),
            warnings: &result.warnings,
            store,
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    let text = read_input(&args.input)?;
    info!("Processing receipt text from {}", args.input.display());

    let pipeline = ReceiptPipeline::from_config(&config);
    let fallback = super::fallback_date(args.date, &config);
    let result = pipeline.parse(&text, fallback);

    for warning in &result.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    if args.show_skipped {
        for line in &result.skipped {
            if let Some(reason) = line.outcome.skip_reason() {
                eprintln!(
                    "  {} line {}: {:?} ({})",
                    style("-").dim(),
                    line.line_number,
                    line.raw.trim(),
                    reason
                );
            }
        }
    }

    let outcome = if args.dry_run {
        None
    } else {
        if result.record.is_empty() && !args.allow_empty {
            anyhow::bail!(
                "No line items found in {}. Use --allow-empty to write an empty partition.",
                args.input.display()
            );
        }

        let store = super::open_store(args.store.as_deref(), &config);
        let write_store = store.clone();
        let record = result.record.clone();
        let outcome = tokio::task::spawn_blocking(move || write_store.write(&record)).await??;

        eprintln!(
            "{} {:?} sheet '{}' in {}",
            style("✓").green(),
            outcome.action,
            outcome.sheet_name,
            store.path().display()
        );
        Some(outcome)
    };

    let output = match args.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&ReceiptReport::new(&result, outcome.as_ref()))?
        }
        OutputFormat::Csv => sheet_to_csv(&Sheet::from_record(&result.record))?,
        OutputFormat::Text => format_text(&result),
    };
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    Ok(fs::read_to_string(input)?)
}

pub fn format_text(result: &ExtractionResult) -> String {
    let mut output = String::new();
    let record = &result.record;

    match &result.date_source {
        DateSource::Text(found) => {
            output.push_str(&format!("Date: {} (read {:?})\n", record.date, found.source))
        }
        DateSource::Default => output.push_str(&format!("Date: {} (default)\n", record.date)),
    }
    output.push('\n');

    let width = record
        .items
        .iter()
        .map(|item| item.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(5);

    for item in &record.items {
        output.push_str(&format!(
            "  {:<width$}  {:>12}\n",
            item.name,
            format_amount(item.amount),
            width = width
        ));
    }
    output.push_str(&format!(
        "  {:<width$}  {:>12}\n",
        "TOTAL",
        format_amount(record.total()),
        width = width
    ));

    output
}
