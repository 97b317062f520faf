//! Batch processing command for multiple document text files.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use ddtx_core::models::document::{ParsedDocument, RawDocument};
use ddtx_core::pipeline::DocumentParser;

use super::process::{self, csv_header, csv_record, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Reference date for plausibility checks (YYYY-MM-DD, default: today)
    #[arg(long)]
    reference_date: Option<NaiveDate>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    document: Option<ParsedDocument>,
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = process::load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut parser = DocumentParser::new().with_config(config);
    if let Some(date) = args.reference_date {
        parser = parser.with_reference_date(date);
    }

    // Documents are independent, so workers share nothing but the parser.
    let jobs = args.jobs.max(1);
    let mut results: Vec<ProcessResult> = Vec::with_capacity(files.len());

    for chunk in files.chunks(jobs) {
        let mut handles = Vec::with_capacity(chunk.len());
        for path in chunk {
            let path = path.clone();
            let parser = parser.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                let outcome = parse_file(&parser, &path);
                (path, outcome)
            }));
        }
        for handle in handles {
            let (path, outcome) = handle.await?;
            match outcome {
                Ok(doc) => {
                    results.push(ProcessResult {
                        path,
                        document: Some(doc),
                        error: None,
                    });
                }
                Err(e) => {
                    let message = e.to_string();
                    if args.continue_on_error {
                        warn!("Failed to process {}: {}", path.display(), message);
                        results.push(ProcessResult {
                            path,
                            document: None,
                            error: Some(message),
                        });
                    } else {
                        error!("Failed to process {}: {}", path.display(), message);
                        anyhow::bail!("Processing failed: {}", message);
                    }
                }
            }
            pb.inc(1);
        }
    }

    pb.finish_with_message("Done");

    for result in &results {
        let Some(doc) = &result.document else { continue };
        let output = process::format_document(doc, args.format)?;

        if let Some(ref output_dir) = args.output_dir {
            let stem = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("document");
            let extension = match args.format {
                OutputFormat::Json => "json",
                OutputFormat::Csv => "csv",
                OutputFormat::Text => "txt",
            };
            fs::write(output_dir.join(format!("{}.{}", stem, extension)), output)?;
        } else {
            println!("{}", output);
        }
    }

    if args.summary {
        write_summary(&results, args.output_dir.as_deref())?;
    }

    let succeeded = results.iter().filter(|r| r.document.is_some()).count();
    let failed = results.len() - succeeded;
    let with_warnings = results
        .iter()
        .filter(|r| r.document.as_ref().is_some_and(|d| !d.warnings.is_empty()))
        .count();

    println!();
    println!(
        "{} Processed {} files in {:.1}s: {} ok ({} with warnings), {} failed",
        style("✓").green(),
        results.len(),
        start.elapsed().as_secs_f64(),
        succeeded,
        with_warnings,
        failed,
    );

    Ok(())
}

fn parse_file(parser: &DocumentParser, path: &PathBuf) -> anyhow::Result<ParsedDocument> {
    let text = fs::read_to_string(path)?;
    let hint = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    Ok(parser.parse(&RawDocument::new(text, hint))?)
}

/// Write one summary CSV row per input file.
fn write_summary(results: &[ProcessResult], output_dir: Option<&std::path::Path>) -> anyhow::Result<()> {
    let summary_path = output_dir
        .unwrap_or_else(|| std::path::Path::new("."))
        .join("summary.csv");

    let mut wtr = csv::Writer::from_path(&summary_path)?;

    let mut header = vec!["file"];
    header.extend(csv_header());
    header.push("warnings");
    header.push("error");
    wtr.write_record(&header)?;

    for result in results {
        let mut record = vec![result.path.display().to_string()];
        match &result.document {
            Some(doc) => {
                record.extend(csv_record(doc));
                record.push(doc.warnings.join("; "));
                record.push(String::new());
            }
            None => {
                record.extend(std::iter::repeat_n(String::new(), csv_header().len() + 1));
                record.push(result.error.clone().unwrap_or_default());
            }
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;

    println!(
        "{} Summary written to {}",
        style("✓").green(),
        summary_path.display()
    );

    Ok(())
}
