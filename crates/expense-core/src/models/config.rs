//! Configuration structures for the export pipeline.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExpenseError;

/// Main configuration for the expense pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpenseConfig {
    /// Analysis service and job waiting configuration.
    pub analysis: AnalysisConfig,

    /// Field resolution configuration.
    pub fields: FieldsConfig,

    /// Export configuration.
    pub export: ExportConfig,
}

/// Analysis service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Object storage bucket holding submitted documents.
    pub bucket: String,

    /// Service region.
    pub region: String,

    /// Delay before each status check, in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum time to wait for a job, in seconds (0 = unbounded).
    pub max_wait_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            poll_interval_ms: 1000,
            max_wait_secs: 300,
        }
    }
}

impl AnalysisConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        (self.max_wait_secs > 0).then(|| Duration::from_secs(self.max_wait_secs))
    }
}

/// Label fallbacks used when the service did not classify a field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldsConfig {
    /// Label text identifying the invoice id.
    pub invoice_id_label: String,

    /// Label text identifying the issue date.
    pub date_label: String,

    /// Label text identifying the total.
    pub total_label: String,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            invoice_id_label: "INVOICE".to_string(),
            date_label: "Date Issued:".to_string(),
            total_label: "Amount Due".to_string(),
        }
    }
}

/// Output artifact formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Json,
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory artifacts are written to.
    pub output_dir: PathBuf,

    /// Formats written for every document.
    pub formats: Vec<ExportFormat>,

    /// Embed the raw analyzed document in JSON output.
    pub include_raw_document: bool,

    /// Write a combined summary CSV across all documents.
    pub write_summary: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            formats: vec![ExportFormat::Json, ExportFormat::Xlsx],
            include_raw_document: false,
            write_summary: false,
        }
    }
}

impl ExpenseConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ExpenseError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| ExpenseError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
