//! Offline analysis service replaying recorded responses.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;
use tracing::debug;

use super::{AnalysisService, StoredObject};
use crate::error::{ExpenseError, TransportError};
use crate::models::document::ExpenseDocument;
use crate::models::job::{JobId, JobStatus, JobStatusResponse};

/// A recording is either one response or the sequence of poll responses.
#[derive(Deserialize)]
#[serde(untagged)]
enum Recording {
    Sequence(Vec<JobStatusResponse>),
    Single(JobStatusResponse),
}

/// Answers status checks from a list of recorded responses.
///
/// Each status check returns the next response; the last one repeats once the
/// list is exhausted. A response without `JobStatus` (the shape of a
/// synchronous analysis response) counts as `SUCCEEDED`. Inline payloads are
/// answered with the final response's documents without inspecting the bytes.
#[derive(Debug)]
pub struct RecordedAnalysisService {
    responses: Vec<JobStatusResponse>,
    status_checks: AtomicUsize,
}

impl RecordedAnalysisService {
    pub fn new(responses: Vec<JobStatusResponse>) -> Self {
        let responses = responses
            .into_iter()
            .map(|mut r| {
                r.job_status.get_or_insert(JobStatus::Succeeded);
                r
            })
            .collect();

        Self {
            responses,
            status_checks: AtomicUsize::new(0),
        }
    }

    /// Parse a recording: one response object or an array of them.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let responses = match serde_json::from_str(json)? {
            Recording::Sequence(responses) => responses,
            Recording::Single(response) => vec![response],
        };
        Ok(Self::new(responses))
    }

    /// Load a recording from disk.
    pub fn from_file(path: &Path) -> Result<Self, ExpenseError> {
        let content = std::fs::read_to_string(path)?;
        let service = Self::from_json(&content)?;
        debug!(
            "Loaded {} recorded responses from {}",
            service.responses.len(),
            path.display()
        );
        Ok(service)
    }

    /// Number of status checks answered so far.
    pub fn status_checks(&self) -> usize {
        self.status_checks.load(Ordering::SeqCst)
    }

    fn last(&self) -> Result<&JobStatusResponse, TransportError> {
        self.responses
            .last()
            .ok_or_else(|| TransportError::Request("recording contains no responses".to_string()))
    }
}

impl AnalysisService for RecordedAnalysisService {
    fn start_analysis(&self, object: &StoredObject) -> Result<JobId, TransportError> {
        self.last()?;
        Ok(JobId::new(format!("recorded:{}/{}", object.bucket, object.key)))
    }

    fn job_status(&self, _job_id: &JobId) -> Result<JobStatusResponse, TransportError> {
        let n = self.status_checks.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(n) {
            Some(response) => Ok(response.clone()),
            None => self.last().cloned(),
        }
    }

    fn analyze_document(&self, _bytes: &[u8]) -> Result<Vec<ExpenseDocument>, TransportError> {
        let last = self.last()?;
        match last.job_status {
            Some(JobStatus::Failed) => Err(TransportError::Request(
                last.status_message
                    .clone()
                    .unwrap_or_else(|| "analysis failed".to_string()),
            )),
            _ => Ok(last.expense_documents.clone()),
        }
    }
}
