//! Data models: analyzed documents, job state, and configuration.

pub mod config;
pub mod document;
pub mod job;

pub use config::{AnalysisConfig, ExpenseConfig, ExportConfig, ExportFormat, FieldsConfig};
pub use document::{Detection, ExpenseDocument, ExpenseField, LineItem, LineItemGroup, ROW_MARKER_TYPE};
pub use job::{AnalysisJob, JobId, JobStatus, JobStatusResponse};
