//! Error types for the expense-core library.

use std::time::Duration;

use thiserror::Error;

/// Main error type for the expense library.
#[derive(Error, Debug)]
pub enum ExpenseError {
    /// Analysis job error.
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failures reaching the analysis service. Never retried here.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request could not be delivered or answered.
    #[error("request failed: {0}")]
    Request(String),

    /// The service rejected our credentials.
    #[error("authentication failed: {0}")]
    Auth(String),
}

/// Errors produced while waiting for an analysis job.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Network or authentication failure during submission or polling.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The job reached the `Failed` state.
    #[error("analysis job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    /// The caller cancelled the wait.
    #[error("analysis job {job_id} was cancelled")]
    Cancelled { job_id: String },

    /// The job was still in progress when the wait bound elapsed.
    #[error("analysis job {job_id} did not finish within {waited:?}")]
    Timeout { job_id: String, waited: Duration },

    /// The service answered with something we cannot interpret.
    #[error("malformed analysis response: {0}")]
    MalformedResponse(String),
}

/// Errors raised by export writers.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A writer failed to produce its artifact.
    #[error("failed to write {name}: {reason}")]
    Write { name: String, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for the expense library.
pub type Result<T> = std::result::Result<T, ExpenseError>;
