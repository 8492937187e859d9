//! Core library for exporting analyzed expense documents.
//!
//! This crate provides:
//! - Expense document data models parsed from the analysis service wire format
//! - An analysis job waiter (submit, poll, terminal state) with cancellation
//! - Canonical field resolution with label fallbacks (invoice id, date, total)
//! - Line item table derivation
//! - Per-document export records handed to pluggable writers

pub mod error;
pub mod models;
pub mod analysis;
pub mod extract;
pub mod export;

pub use error::{AnalysisError, ExpenseError, ExportError, Result, TransportError};
pub use models::document::{ExpenseDocument, ExpenseField, LineItem, LineItemGroup};
pub use models::job::{AnalysisJob, JobId, JobStatus, JobStatusResponse};
pub use analysis::{
    AnalysisJobWaiter, AnalysisService, CancelToken, DocumentLocation, RecordedAnalysisService,
    StoredObject,
};
pub use extract::{
    FieldMatch, FieldResolver, FieldRule, LineItemTableBuilder, ResolvedFields, SchemaDrift, Table,
};
pub use models::config::{ExpenseConfig, ExportFormat};
pub use export::{ExportCoordinator, ExportRecord, ExportSummary, ExportWriter, FieldRecord};
