//! Process command - extract data from a single document text file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use clap::Args;
use console::style;
use tracing::{debug, info};

use ddtx_core::models::config::DdtxConfig;
use ddtx_core::models::document::{ParsedDocument, RawDocument};
use ddtx_core::pipeline::DocumentParser;
use ddtx_core::rules::format_italian_amount;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input text file (extracted document text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Reference date for plausibility checks (YYYY-MM-DD, default: today)
    #[arg(long)]
    reference_date: Option<NaiveDate>,

    /// Treat the input path stem as the filename hint instead of the full name
    #[arg(long)]
    stem_hint: bool,

    /// Print warnings even when writing output to a file
    #[arg(long)]
    show_warnings: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());
    let text = fs::read_to_string(&args.input)?;

    let hint = if args.stem_hint {
        args.input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    } else {
        args.input
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string()
    };

    let mut parser = DocumentParser::new().with_config(config);
    if let Some(date) = args.reference_date {
        parser = parser.with_reference_date(date);
    }

    let doc = parser.parse(&RawDocument::new(text, hint))?;

    let output = format_document(&doc, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if !doc.warnings.is_empty() && (args.output.is_none() || args.show_warnings) {
        eprintln!("{}", style("Warnings:").yellow());
        for warning in &doc.warnings {
            eprintln!("  - {}", warning);
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Load configuration from an explicit path, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DdtxConfig> {
    match config_path {
        Some(path) => Ok(DdtxConfig::from_file(Path::new(path))?),
        None => Ok(DdtxConfig::default()),
    }
}

pub fn format_document(doc: &ParsedDocument, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(doc)?),
        OutputFormat::Csv => format_csv(doc),
        OutputFormat::Text => format_text(doc),
    }
}

pub fn csv_header() -> [&'static str; 10] {
    [
        "kind",
        "document_number",
        "document_date",
        "customer_code",
        "client_name",
        "client_vat",
        "delivery_address",
        "subtotal",
        "vat_total",
        "grand_total",
    ]
}

pub fn csv_record(doc: &ParsedDocument) -> [String; 10] {
    [
        format!("{:?}", doc.kind),
        doc.document_number.clone().unwrap_or_default(),
        doc.document_date
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default(),
        doc.customer_code.clone().unwrap_or_default(),
        doc.client.name.clone(),
        doc.client.vat_number.clone().unwrap_or_default(),
        doc.delivery_address
            .as_ref()
            .map(|a| a.format())
            .unwrap_or_default(),
        doc.totals.subtotal.to_string(),
        doc.totals.vat_total.to_string(),
        doc.totals.grand_total.to_string(),
    ]
}

fn format_csv(doc: &ParsedDocument) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(csv_header())?;
    wtr.write_record(csv_record(doc))?;
    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(doc: &ParsedDocument) -> anyhow::Result<String> {
    let mut output = String::new();

    output.push_str(&format!("Document: {:?}", doc.kind));
    if let Some(number) = &doc.document_number {
        output.push_str(&format!(" n. {}", number));
    }
    output.push('\n');
    if let Some(date) = doc.document_date {
        output.push_str(&format!("Date: {}\n", date.format("%d/%m/%Y")));
    }
    if let Some(code) = &doc.customer_code {
        output.push_str(&format!("Customer code: {}\n", code));
    }
    output.push('\n');

    output.push_str("Client:\n");
    output.push_str(&format!("  {}\n", doc.client.name));
    if let Some(vat) = &doc.client.vat_number {
        output.push_str(&format!("  P.IVA: {}\n", vat));
    }
    if let Some(address) = &doc.client.address {
        output.push_str(&format!("  {}\n", address.format()));
    }
    if let Some(delivery) = &doc.delivery_address {
        output.push_str(&format!("Delivery: {}\n", delivery.format()));
    }
    output.push('\n');

    output.push_str(&format!("Items: {}\n", doc.items.len()));
    for item in &doc.items {
        let marker = if item.is_free_goods { " (omaggio)" } else { "" };
        output.push_str(&format!(
            "  {} {} x{} = {}{}\n",
            item.code,
            item.description,
            item.quantity,
            format_italian_amount(item.line_total),
            marker,
        ));
    }
    output.push('\n');

    output.push_str("Totals:\n");
    for group in &doc.totals.by_vat_rate {
        output.push_str(&format!(
            "  {:>3}  taxable {}  tax {}\n",
            group.rate.display(),
            format_italian_amount(group.taxable_amount),
            format_italian_amount(group.tax_amount),
        ));
    }
    output.push_str(&format!(
        "  Subtotal: {}\n  VAT:      {}\n  Total:    {}\n",
        format_italian_amount(doc.totals.subtotal),
        format_italian_amount(doc.totals.vat_total),
        format_italian_amount(doc.totals.grand_total),
    ));

    Ok(output)
}
