//! Asynchronous analysis job state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::document::ExpenseDocument;
use crate::error::AnalysisError;

/// Identifier the analysis service assigns to a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job lifecycle: `Submitted -> InProgress -> {Succeeded | PartialSuccess | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Accepted by the service, no status observed yet.
    Submitted,
    /// Still running.
    InProgress,
    /// Finished with a payload.
    Succeeded,
    /// Finished, but some pages could not be analyzed.
    PartialSuccess,
    /// Finished without a usable payload.
    Failed,
}

impl JobStatus {
    /// Whether no further transition can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::PartialSuccess | JobStatus::Failed
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Submitted => "SUBMITTED",
            JobStatus::InProgress => "IN_PROGRESS",
            JobStatus::Succeeded => "SUCCEEDED",
            JobStatus::PartialSuccess => "PARTIAL_SUCCESS",
            JobStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// One status answer from the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobStatusResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_status: Option<JobStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,

    #[serde(default)]
    pub expense_documents: Vec<ExpenseDocument>,
}

impl JobStatusResponse {
    pub fn in_progress() -> Self {
        Self {
            job_status: Some(JobStatus::InProgress),
            ..Default::default()
        }
    }

    pub fn succeeded(documents: Vec<ExpenseDocument>) -> Self {
        Self {
            job_status: Some(JobStatus::Succeeded),
            status_message: None,
            expense_documents: documents,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            job_status: Some(JobStatus::Failed),
            status_message: Some(message.into()),
            expense_documents: Vec::new(),
        }
    }
}

/// A job owned by the waiter from submission until its result is consumed.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub job_id: JobId,
    pub status: JobStatus,
    pub status_message: Option<String>,
    pub documents: Option<Vec<ExpenseDocument>>,
    /// Number of status checks performed so far.
    pub polls: u32,
}

impl AnalysisJob {
    /// A freshly submitted job.
    pub fn submitted(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::Submitted,
            status_message: None,
            documents: None,
            polls: 0,
        }
    }

    /// Apply a status answer.
    ///
    /// Terminal states accept no further observations. A terminal success
    /// stores the payload.
    pub fn observe(&mut self, response: JobStatusResponse) -> Result<JobStatus, AnalysisError> {
        self.polls += 1;

        if self.status.is_terminal() {
            return Err(AnalysisError::MalformedResponse(format!(
                "job {} reported {} after reaching {}",
                self.job_id,
                response
                    .job_status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "no status".to_string()),
                self.status
            )));
        }

        let status = response.job_status.ok_or_else(|| {
            AnalysisError::MalformedResponse(format!("job {} response has no status", self.job_id))
        })?;

        self.status = status;
        self.status_message = response.status_message;

        if matches!(status, JobStatus::Succeeded | JobStatus::PartialSuccess) {
            self.documents = Some(response.expense_documents);
        }

        Ok(status)
    }

    /// Consume the job and hand out its payload.
    pub fn into_documents(self) -> Vec<ExpenseDocument> {
        self.documents.unwrap_or_default()
    }
}
