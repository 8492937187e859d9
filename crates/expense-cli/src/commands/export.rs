//! Export command - wait for an analysis result and write per-document artifacts.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use expense_core::models::config::ExportFormat;
use expense_core::{ExportCoordinator, ExportWriter};

use super::{analyze, load_config, AnalysisArgs};
use crate::writers::{write_summary, CsvWriter, JsonWriter, XlsxWriter};

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output formats (comma separated)
    #[arg(short, long, value_enum, value_delimiter = ',')]
    format: Vec<OutputFormat>,

    /// Embed the raw analyzed document in JSON output
    #[arg(long)]
    raw: bool,

    /// Also write a combined summary.csv
    #[arg(long)]
    summary: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON record per document
    Json,
    /// CSV fields and tables per document
    Csv,
    /// Spreadsheet per document
    Xlsx,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => ExportFormat::Json,
            OutputFormat::Csv => ExportFormat::Csv,
            OutputFormat::Xlsx => ExportFormat::Xlsx,
        }
    }
}

pub async fn run(args: ExportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.export.output_dir.clone());
    let formats: Vec<ExportFormat> = if args.format.is_empty() {
        config.export.formats.clone()
    } else {
        args.format.iter().copied().map(ExportFormat::from).collect()
    };
    if formats.is_empty() {
        anyhow::bail!("No output formats selected");
    }

    info!("Exporting {}", args.analysis.input.display());
    let documents = analyze(&args.analysis, &config).await?;

    fs::create_dir_all(&output_dir)?;

    let json = JsonWriter::new(&output_dir, args.raw || config.export.include_raw_document);
    let csv = CsvWriter::new(&output_dir);
    let xlsx = XlsxWriter::new(&output_dir);

    let mut writers: Vec<&dyn ExportWriter> = Vec::new();
    for format in &formats {
        let writer: &dyn ExportWriter = match format {
            ExportFormat::Json => &json,
            ExportFormat::Csv => &csv,
            ExportFormat::Xlsx => &xlsx,
        };
        if !writers.iter().any(|w| w.format_name() == writer.format_name()) {
            writers.push(writer);
        }
    }

    let coordinator = ExportCoordinator::from_config(&config.fields);
    let summary = coordinator.export(&documents, &writers)?;

    for path in &summary.artifacts {
        println!("{} {}", style("✓").green(), path.display());
    }

    if args.summary || config.export.write_summary {
        let summary_path = output_dir.join("summary.csv");
        write_summary(&summary_path, &summary.records)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let drifted: usize = summary
        .records
        .iter()
        .flat_map(|r| &r.tables)
        .map(|t| t.drift.len())
        .sum();
    if drifted > 0 {
        eprintln!(
            "{} {} line item rows did not match their table's columns and were normalized",
            style("⚠").yellow(),
            drifted
        );
    }

    println!(
        "{} Exported {} documents in {:?}",
        style("✓").green(),
        summary.records.len(),
        start.elapsed()
    );
    debug!("Wrote {} artifacts", summary.artifacts.len());

    Ok(())
}
