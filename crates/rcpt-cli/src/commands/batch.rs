//! Batch processing command for multiple receipt text files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use rcpt_core::models::receipt::ReceiptRecord;
use rcpt_core::receipt::{DateSource, ReceiptParser, ReceiptPipeline};
use rcpt_core::receipt::rules::format_amount;
use rcpt_core::store::{RecordStore, WriteOutcome};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of OCR text files (e.g. "scans/*.txt")
    #[arg(required = true)]
    input: String,

    /// Workbook to write to (default: store.path from config)
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Date to use for receipts without one (YYYY-MM-DD, default: today)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Write a per-file summary CSV here
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Extract only, do not touch the store
    #[arg(long)]
    dry_run: bool,

    /// Write TOTAL-only partitions for receipts without items
    #[arg(long)]
    allow_empty: bool,
}

/// Result of processing a single file.
struct FileResult {
    index: usize,
    path: PathBuf,
    record: Option<ReceiptRecord>,
    date_from_text: bool,
    outcome: Option<WriteOutcome>,
    error: Option<String>,
    processing_time_ms: u64,
}

/// Per-file settings shared by all workers.
struct Job {
    pipeline: ReceiptPipeline,
    store: RecordStore,
    fallback: NaiveDate,
    dry_run: bool,
    allow_empty: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;

    // Expand glob pattern
    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let job = Arc::new(Job {
        pipeline: ReceiptPipeline::from_config(&config),
        store: super::open_store(args.store.as_deref(), &config),
        fallback: super::fallback_date(args.date, &config),
        dry_run: args.dry_run,
        allow_empty: args.allow_empty,
    });

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // Extraction runs in parallel; store writes serialise on the store lock.
    let permits = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut tasks = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let permits = Arc::clone(&permits);
        let job = Arc::clone(&job);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            tokio::task::spawn_blocking(move || process_single_file(index, path, &job)).await
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let result = joined??;
        overall_pb.inc(1);

        if let Some(error_msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), error_msg);
            } else {
                error!("Failed to process {}: {}", result.path.display(), error_msg);
                tasks.abort_all();
                overall_pb.abandon();
                anyhow::bail!("Processing failed for {}: {}", result.path.display(), error_msg);
            }
        }

        results.push(result);
    }

    overall_pb.finish_with_message("Complete");
    results.sort_by_key(|r| r.index);

    let successful: Vec<_> = results.iter().filter(|r| r.error.is_none()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    // Print summary
    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !args.dry_run {
        println!("   store: {}", job.store.path().display());
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(index: usize, path: PathBuf, job: &Job) -> FileResult {
    let file_start = Instant::now();
    let mut result = FileResult {
        index,
        path,
        record: None,
        date_from_text: false,
        outcome: None,
        error: None,
        processing_time_ms: 0,
    };

    if let Err(e) = extract_and_store(&mut result, job) {
        result.error = Some(e.to_string());
    }

    result.processing_time_ms = file_start.elapsed().as_millis() as u64;
    result
}

fn extract_and_store(result: &mut FileResult, job: &Job) -> anyhow::Result<()> {
    let text = fs::read_to_string(&result.path)?;
    let extraction = job.pipeline.parse(&text, job.fallback);

    debug!(
        "{}: {} items, {} lines skipped",
        result.path.display(),
        extraction.record.item_count(),
        extraction.skipped.len()
    );

    result.date_from_text = matches!(extraction.date_source, DateSource::Text(_));
    result.record = Some(extraction.record.clone());

    if job.dry_run {
        return Ok(());
    }

    if extraction.record.is_empty() && !job.allow_empty {
        anyhow::bail!("No line items found");
    }

    result.outcome = Some(job.store.write(&extraction.record)?);
    Ok(())
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "date",
        "date_source",
        "items",
        "total",
        "sheet",
        "action",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        let status = if result.error.is_some() { "error" } else { "success" };
        let (date, items, total) = match &result.record {
            Some(record) => (
                record.date.to_string(),
                record.item_count().to_string(),
                format_amount(record.total()),
            ),
            None => Default::default(),
        };
        let date_source = match (&result.record, result.date_from_text) {
            (None, _) => "",
            (Some(_), true) => "text",
            (Some(_), false) => "default",
        };
        let (sheet, action) = match &result.outcome {
            Some(outcome) => (outcome.sheet_name.clone(), format!("{:?}", outcome.action)),
            None => Default::default(),
        };

        wtr.write_record([
            filename,
            status,
            &date,
            date_source,
            &items,
            &total,
            &sheet,
            &action,
            &result.processing_time_ms.to_string(),
            result.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
