//! Artifact writers: JSON, CSV and XLSX per document, plus a combined summary.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;
use tempfile::NamedTempFile;

use expense_core::export::FIELD_HEADERS;
use expense_core::models::config::ExportFormat;
use expense_core::{ExpenseDocument, ExportError, ExportRecord, ExportWriter, Table};

/// Excel caps worksheet names at 31 characters.
const MAX_SHEET_NAME: usize = 31;

/// First worksheet row (0-based) used for line item tables.
const TABLE_START_ROW: u32 = 4;

#[derive(Serialize)]
struct JsonArtifact<'a> {
    #[serde(flatten)]
    record: &'a ExportRecord,

    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<&'a ExpenseDocument>,
}

/// Writes `<name>.json` with the export record.
pub struct JsonWriter {
    output_dir: PathBuf,
    include_raw_document: bool,
}

impl JsonWriter {
    pub fn new(output_dir: impl Into<PathBuf>, include_raw_document: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            include_raw_document,
        }
    }
}

impl ExportWriter for JsonWriter {
    fn format_name(&self) -> &str {
        ExportFormat::Json.extension()
    }

    fn write(
        &self,
        record: &ExportRecord,
        document: &ExpenseDocument,
        name: &str,
    ) -> Result<PathBuf, ExportError> {
        let artifact = JsonArtifact {
            record,
            document: self.include_raw_document.then_some(document),
        };

        let path = self.output_dir.join(format!("{}.{}", name, self.format_name()));
        fs::write(&path, serde_json::to_string_pretty(&artifact)?)?;
        Ok(path)
    }
}

/// Writes `<name>.csv`: the field block followed by each table.
pub struct CsvWriter {
    output_dir: PathBuf,
}

impl CsvWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl ExportWriter for CsvWriter {
    fn format_name(&self) -> &str {
        ExportFormat::Csv.extension()
    }

    fn write(
        &self,
        record: &ExportRecord,
        _document: &ExpenseDocument,
        name: &str,
    ) -> Result<PathBuf, ExportError> {
        let path = self.output_dir.join(format!("{}.{}", name, self.format_name()));
        let content = format_csv(record).map_err(|e| ExportError::Write {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        fs::write(&path, content)?;
        Ok(path)
    }
}

fn format_csv(record: &ExportRecord) -> Result<String, csv::Error> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(vec![]);

    wtr.write_record(FIELD_HEADERS)?;
    wtr.write_record(record.fields.values())?;

    for (i, table) in record.tables.iter().enumerate() {
        wtr.write_record([format!("Table {}", i + 1)])?;
        write_table(&mut wtr, table)?;
    }

    let data = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

fn write_table<W: Write>(wtr: &mut csv::Writer<W>, table: &Table) -> Result<(), csv::Error> {
    if table.header.is_empty() {
        return Ok(());
    }
    wtr.write_record(&table.header)?;
    for row in &table.rows {
        wtr.write_record(row)?;
    }
    Ok(())
}

/// Writes `<name>.xlsx` with one worksheet per document.
pub struct XlsxWriter {
    output_dir: PathBuf,
}

impl XlsxWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl ExportWriter for XlsxWriter {
    fn format_name(&self) -> &str {
        ExportFormat::Xlsx.extension()
    }

    fn write(
        &self,
        record: &ExportRecord,
        _document: &ExpenseDocument,
        name: &str,
    ) -> Result<PathBuf, ExportError> {
        let path = self.output_dir.join(format!("{}.{}", name, self.format_name()));
        build_workbook(record, name, &path).map_err(|e| ExportError::Write {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(path)
    }
}

fn build_workbook(record: &ExportRecord, name: &str, path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let date_format = Format::new().set_num_format("dd/mm/yyyy hh:mm");

    let worksheet = workbook.add_worksheet();
    let sheet_name: String = name.chars().take(MAX_SHEET_NAME).collect();
    worksheet.set_name(&sheet_name)?;

    let width = record
        .tables
        .iter()
        .map(Table::column_count)
        .max()
        .unwrap_or(0)
        .max(FIELD_HEADERS.len());
    for col in 0..width as u16 {
        worksheet.set_column_width(col, 30)?;
    }

    for (col, header) in FIELD_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    let [invoice_id, date, total] = record.fields.values();
    worksheet.write_string(1, 0, invoice_id)?;
    match &record.parsed.date {
        Some(parsed) => {
            worksheet.write_datetime_with_format(1, 1, parsed, &date_format)?;
        }
        None => {
            worksheet.write_string(1, 1, date)?;
        }
    }
    match record.parsed.total.and_then(|d| d.to_string().parse::<f64>().ok()) {
        Some(amount) => {
            worksheet.write_number(1, 2, amount)?;
        }
        None => {
            worksheet.write_string(1, 2, total)?;
        }
    }

    let mut row = TABLE_START_ROW;
    for table in &record.tables {
        if table.header.is_empty() {
            continue;
        }
        for (col, header) in table.header.iter().enumerate() {
            worksheet.write_string_with_format(row, col as u16, header, &bold)?;
        }
        row += 1;
        for values in &table.rows {
            for (col, value) in values.iter().enumerate() {
                worksheet.write_string(row, col as u16, value)?;
            }
            row += 1;
        }
        row += 1;
    }

    workbook.save(path)?;
    Ok(())
}

/// Write `summary.csv` for all records at once.
///
/// The file is staged next to its destination and renamed into place, so a
/// failure never leaves a partial summary behind.
pub fn write_summary(path: &Path, records: &[ExportRecord]) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(dir)?;

    {
        let mut wtr = csv::Writer::from_writer(staged.as_file_mut());
        wtr.write_record(["index", "name", "invoice_id", "date", "total", "tables", "rows"])?;

        for record in records {
            let [invoice_id, date, total] = record.fields.values();
            let rows: usize = record.tables.iter().map(Table::row_count).sum();
            wtr.write_record([
                record.index.to_string().as_str(),
                record.output_name().as_str(),
                invoice_id,
                date,
                total,
                record.tables.len().to_string().as_str(),
                rows.to_string().as_str(),
            ])?;
        }
        wtr.flush()?;
    }

    staged.persist(path)?;
    Ok(())
}
