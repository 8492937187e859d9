//! Fields command - print resolved fields and table shapes.

use clap::Args;

use expense_core::export::FIELD_HEADERS;
use expense_core::{ExportCoordinator, ExportRecord};

use super::{analyze, load_config, AnalysisArgs};

/// Arguments for the fields command.
#[derive(Args)]
pub struct FieldsArgs {
    #[command(flatten)]
    analysis: AnalysisArgs,

    /// Print records as JSON instead of text
    #[arg(long)]
    json: bool,
}

pub async fn run(args: FieldsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let documents = analyze(&args.analysis, &config).await?;

    let records = ExportCoordinator::from_config(&config.fields).records(&documents);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        for record in &records {
            print!("{}", format_text(record));
        }
    }

    Ok(())
}

fn format_text(record: &ExportRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Document {} ({})\n", record.index, record.output_name()));
    for (header, value) in FIELD_HEADERS.iter().zip(record.fields.values()) {
        output.push_str(&format!("  {:<8} {}\n", format!("{}:", header), value));
    }

    for (i, table) in record.tables.iter().enumerate() {
        output.push_str(&format!(
            "  Table {}: {} columns x {} rows",
            i + 1,
            table.column_count(),
            table.row_count()
        ));
        if !table.drift.is_empty() {
            output.push_str(&format!(" ({} rows normalized)", table.drift.len()));
        }
        output.push('\n');
        if !table.header.is_empty() {
            output.push_str(&format!("    {}\n", table.header.join(" | ")));
        }
    }

    output
}
