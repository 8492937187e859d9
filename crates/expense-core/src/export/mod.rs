//! Export coordination.
//!
//! For each analyzed document the coordinator resolves the flat fields, builds
//! one table per line item group, and hands the resulting record to every
//! configured writer. Writers own serialization and storage.

mod record;

pub use record::{ExportRecord, FieldRecord, ParsedValues, FIELD_HEADERS};

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::ExportError;
use crate::extract::{parse_amount, parse_date, FieldResolver, LineItemTableBuilder};
use crate::models::config::FieldsConfig;
use crate::models::document::ExpenseDocument;

/// Serializes one export record to an artifact.
pub trait ExportWriter {
    /// Short format name used in logs.
    fn format_name(&self) -> &str;

    /// Write the artifact for one document and return where it went.
    fn write(
        &self,
        record: &ExportRecord,
        document: &ExpenseDocument,
        name: &str,
    ) -> Result<PathBuf, ExportError>;
}

/// Outcome of exporting a job's documents.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    pub records: Vec<ExportRecord>,
    pub artifacts: Vec<PathBuf>,
}

/// Turns expense documents into export records and dispatches them.
#[derive(Debug, Clone, Default)]
pub struct ExportCoordinator {
    resolver: FieldResolver,
    tables: LineItemTableBuilder,
}

impl ExportCoordinator {
    pub fn new(resolver: FieldResolver) -> Self {
        Self {
            resolver,
            tables: LineItemTableBuilder::new(),
        }
    }

    pub fn from_config(config: &FieldsConfig) -> Self {
        Self::new(FieldResolver::from_config(config))
    }

    /// Build the export record for one document.
    pub fn record(&self, document: &ExpenseDocument) -> ExportRecord {
        self.record_at(document, document.expense_index)
    }

    fn record_at(&self, document: &ExpenseDocument, index: u32) -> ExportRecord {
        let fields = self.resolver.resolve(&document.summary_fields);

        let parsed = ParsedValues {
            date: fields.date.as_deref().and_then(parse_date),
            total: fields.total.as_deref().and_then(parse_amount),
        };

        let tables = self.tables.build_all(&document.line_item_groups);
        debug!(
            "Document {}: {} tables, invoice id {:?}",
            index,
            tables.len(),
            fields.invoice_id
        );

        ExportRecord {
            index,
            fields: fields.into(),
            parsed,
            tables,
        }
    }

    /// Build records for all documents, in arrival order.
    pub fn records(&self, documents: &[ExpenseDocument]) -> Vec<ExportRecord> {
        documents
            .iter()
            .zip(document_indices(documents))
            .map(|(d, index)| self.record_at(d, index))
            .collect()
    }

    /// Export every document through every writer.
    ///
    /// Stops at the first writer error. Artifacts already written stay in
    /// place.
    pub fn export(
        &self,
        documents: &[ExpenseDocument],
        writers: &[&dyn ExportWriter],
    ) -> Result<ExportSummary, ExportError> {
        let mut summary = ExportSummary::default();

        for (document, index) in documents.iter().zip(document_indices(documents)) {
            let record = self.record_at(document, index);
            let name = record.output_name();

            for writer in writers {
                let path = writer.write(&record, document, &name)?;
                debug!("Wrote {} artifact {}", writer.format_name(), path.display());
                summary.artifacts.push(path);
            }

            summary.records.push(record);
        }

        info!(
            "Exported {} documents to {} artifacts",
            summary.records.len(),
            summary.artifacts.len()
        );
        Ok(summary)
    }
}

/// Index of each document within its job.
///
/// The service's `ExpenseIndex` is used when every document carries a distinct
/// one. Otherwise documents are numbered by arrival order, starting at 1, so
/// artifact names stay unique.
fn document_indices(documents: &[ExpenseDocument]) -> Vec<u32> {
    let mut seen = HashSet::new();
    let distinct = documents
        .iter()
        .all(|d| d.expense_index > 0 && seen.insert(d.expense_index));

    if distinct {
        return documents.iter().map(|d| d.expense_index).collect();
    }

    warn!(
        "Documents lack distinct indices, numbering {} documents by arrival order",
        documents.len()
    );
    (1..).take(documents.len()).collect()
}
