//! Analysis service seam and job waiting.
//!
//! The remote service itself is an external collaborator: anything that can
//! start a job, report its status, or analyze an inline payload implements
//! [`AnalysisService`]. [`AnalysisJobWaiter`] drives the job state machine on
//! top of it.

mod recorded;
mod waiter;

pub use recorded::RecordedAnalysisService;
pub use waiter::AnalysisJobWaiter;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::TransportError;
use crate::models::document::ExpenseDocument;
use crate::models::job::{JobId, JobStatusResponse};

/// A document already uploaded to object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
}

impl StoredObject {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

/// Where the analysis service reads the document from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentLocation {
    /// Object storage location, analyzed as an asynchronous job.
    Stored(StoredObject),
    /// Inline bytes (a single rendered page), analyzed synchronously.
    Inline(Vec<u8>),
}

/// Remote expense analysis service.
pub trait AnalysisService {
    /// Start an asynchronous analysis job for a stored document.
    fn start_analysis(&self, object: &StoredObject) -> Result<JobId, TransportError>;

    /// Fetch the current status of a job.
    fn job_status(&self, job_id: &JobId) -> Result<JobStatusResponse, TransportError>;

    /// Analyze an inline payload synchronously.
    fn analyze_document(&self, bytes: &[u8]) -> Result<Vec<ExpenseDocument>, TransportError>;
}

impl<S: AnalysisService + ?Sized> AnalysisService for &S {
    fn start_analysis(&self, object: &StoredObject) -> Result<JobId, TransportError> {
        (**self).start_analysis(object)
    }

    fn job_status(&self, job_id: &JobId) -> Result<JobStatusResponse, TransportError> {
        (**self).job_status(job_id)
    }

    fn analyze_document(&self, bytes: &[u8]) -> Result<Vec<ExpenseDocument>, TransportError> {
        (**self).analyze_document(bytes)
    }
}

/// Cooperative cancellation flag shared between the waiter and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }
}
