//! Submit, poll, and collect the terminal result of an analysis job.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{AnalysisService, CancelToken, DocumentLocation};
use crate::error::AnalysisError;
use crate::models::config::AnalysisConfig;
use crate::models::document::ExpenseDocument;
use crate::models::job::{AnalysisJob, JobStatus};

/// Longest uninterrupted sleep between cancellation checks.
const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Drives an analysis job from submission to a terminal state.
///
/// The wait blocks the calling thread. It sleeps `poll_interval` before every
/// status check, stops as soon as the job leaves `InProgress`, and can be
/// aborted through a [`CancelToken`] or bounded by `max_wait`.
pub struct AnalysisJobWaiter<S> {
    service: S,
    poll_interval: Duration,
    max_wait: Option<Duration>,
}

impl<S: AnalysisService> AnalysisJobWaiter<S> {
    /// Create a waiter with the polling bounds from `config`.
    pub fn new(service: S, config: &AnalysisConfig) -> Self {
        Self {
            service,
            poll_interval: config.poll_interval(),
            max_wait: config.max_wait(),
        }
    }

    /// Set the delay before each status check.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the maximum wait (`None` = unbounded).
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// The underlying service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Submit a document and wait for its expense documents.
    ///
    /// Documents are returned in the order the service produced them.
    pub fn submit_and_await(
        &self,
        location: &DocumentLocation,
        cancel: &CancelToken,
    ) -> Result<Vec<ExpenseDocument>, AnalysisError> {
        match location {
            DocumentLocation::Inline(bytes) => {
                if cancel.is_cancelled() {
                    return Err(AnalysisError::Cancelled {
                        job_id: "inline".to_string(),
                    });
                }

                info!("Analyzing inline document ({} bytes)", bytes.len());
                let documents = self.service.analyze_document(bytes)?;
                info!("Inline analysis returned {} documents", documents.len());
                Ok(documents)
            }
            DocumentLocation::Stored(object) => {
                let job_id = self.service.start_analysis(object)?;
                info!(
                    "Started analysis job {} for {}/{}",
                    job_id, object.bucket, object.key
                );

                let job = self.await_job(AnalysisJob::submitted(job_id), cancel)?;
                Ok(job.into_documents())
            }
        }
    }

    /// Poll an already submitted job until it is terminal.
    pub fn await_job(
        &self,
        mut job: AnalysisJob,
        cancel: &CancelToken,
    ) -> Result<AnalysisJob, AnalysisError> {
        let started = Instant::now();

        loop {
            let nap = match self.max_wait {
                Some(max) => self.poll_interval.min(max.saturating_sub(started.elapsed())),
                None => self.poll_interval,
            };

            if !pause(nap, cancel) {
                info!("Wait for job {} cancelled after {} polls", job.job_id, job.polls);
                return Err(AnalysisError::Cancelled {
                    job_id: job.job_id.to_string(),
                });
            }

            let response = self.service.job_status(&job.job_id)?;
            let status = job.observe(response)?;
            debug!("Job {} poll {}: {}", job.job_id, job.polls, status);

            match status {
                JobStatus::Succeeded => {
                    info!(
                        "Job {} succeeded after {} polls with {} documents",
                        job.job_id,
                        job.polls,
                        job.documents.as_ref().map_or(0, Vec::len)
                    );
                    return Ok(job);
                }
                JobStatus::PartialSuccess => {
                    warn!(
                        "Job {} only partially succeeded: {}",
                        job.job_id,
                        job.status_message.as_deref().unwrap_or("no status message")
                    );
                    return Ok(job);
                }
                JobStatus::Failed => {
                    return Err(AnalysisError::JobFailed {
                        job_id: job.job_id.to_string(),
                        message: job
                            .status_message
                            .unwrap_or_else(|| "no status message".to_string()),
                    });
                }
                JobStatus::InProgress | JobStatus::Submitted => {
                    if let Some(max) = self.max_wait {
                        let waited = started.elapsed();
                        if waited >= max {
                            return Err(AnalysisError::Timeout {
                                job_id: job.job_id.to_string(),
                                waited,
                            });
                        }
                    }
                }
            }
        }
    }
}

/// Sleep for `duration` unless cancelled first. Returns `false` on cancellation.
fn pause(duration: Duration, cancel: &CancelToken) -> bool {
    let deadline = Instant::now() + duration;

    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(CANCEL_CHECK_INTERVAL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{RecordedAnalysisService, StoredObject};
    use crate::error::TransportError;
    use crate::models::job::{JobId, JobStatusResponse};

    fn stored() -> DocumentLocation {
        DocumentLocation::Stored(StoredObject::new("bucket", "invoice.pdf"))
    }

    fn document(index: u32) -> ExpenseDocument {
        ExpenseDocument {
            expense_index: index,
            ..Default::default()
        }
    }

    fn waiter(service: RecordedAnalysisService) -> AnalysisJobWaiter<RecordedAnalysisService> {
        AnalysisJobWaiter::new(service, &AnalysisConfig::default())
            .with_poll_interval(Duration::ZERO)
            .with_max_wait(None)
    }

    struct OfflineService;

    impl AnalysisService for OfflineService {
        fn start_analysis(&self, _object: &StoredObject) -> Result<JobId, TransportError> {
            Err(TransportError::Auth("expired token".to_string()))
        }

        fn job_status(&self, _job_id: &JobId) -> Result<JobStatusResponse, TransportError> {
            Err(TransportError::Request("connection reset".to_string()))
        }

        fn analyze_document(&self, _bytes: &[u8]) -> Result<Vec<ExpenseDocument>, TransportError> {
            Err(TransportError::Request("connection reset".to_string()))
        }
    }

    #[test]
    fn test_succeeds_after_in_progress_polls() {
        let service = RecordedAnalysisService::new(vec![
            JobStatusResponse::in_progress(),
            JobStatusResponse::in_progress(),
            JobStatusResponse::succeeded(vec![document(1), document(2)]),
        ]);
        let waiter = waiter(service);

        let documents = waiter.submit_and_await(&stored(), &CancelToken::new()).unwrap();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].expense_index, 1);
        assert_eq!(documents[1].expense_index, 2);
        assert_eq!(waiter.service().status_checks(), 3);
    }

    #[test]
    fn test_failed_job_carries_status_message() {
        let service = RecordedAnalysisService::new(vec![
            JobStatusResponse::in_progress(),
            JobStatusResponse::failed("quota exceeded"),
        ]);
        let waiter = waiter(service);

        let err = waiter.submit_and_await(&stored(), &CancelToken::new()).unwrap_err();

        match err {
            AnalysisError::JobFailed { message, .. } => assert_eq!(message, "quota exceeded"),
            other => panic!("expected JobFailed, got {other:?}"),
        }
        assert_eq!(waiter.service().status_checks(), 2);
    }

    #[test]
    fn test_partial_success_returns_payload() {
        let mut partial = JobStatusResponse::succeeded(vec![document(1)]);
        partial.job_status = Some(JobStatus::PartialSuccess);
        let waiter = waiter(RecordedAnalysisService::new(vec![partial]));

        let documents = waiter.submit_and_await(&stored(), &CancelToken::new()).unwrap();
        assert_eq!(documents.len(), 1);
    }

    #[test]
    fn test_cancelled_before_first_poll() {
        let waiter = waiter(RecordedAnalysisService::new(vec![JobStatusResponse::in_progress()]));
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = waiter.submit_and_await(&stored(), &cancel).unwrap_err();

        assert!(matches!(err, AnalysisError::Cancelled { .. }));
        assert_eq!(waiter.service().status_checks(), 0);
    }

    #[test]
    fn test_cancel_interrupts_sleep() {
        let waiter = waiter(RecordedAnalysisService::new(vec![JobStatusResponse::in_progress()]))
            .with_poll_interval(Duration::from_secs(60));
        let cancel = CancelToken::new();

        let trigger = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            trigger.cancel();
        });

        let started = Instant::now();
        let err = waiter.submit_and_await(&stored(), &cancel).unwrap_err();
        handle.join().unwrap();

        assert!(matches!(err, AnalysisError::Cancelled { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_times_out_while_in_progress() {
        let waiter = waiter(RecordedAnalysisService::new(vec![JobStatusResponse::in_progress()]))
            .with_max_wait(Some(Duration::ZERO));

        let err = waiter.submit_and_await(&stored(), &CancelToken::new()).unwrap_err();

        assert!(matches!(err, AnalysisError::Timeout { .. }));
        assert_eq!(waiter.service().status_checks(), 1);
    }

    #[test]
    fn test_transport_errors_propagate() {
        let waiter = AnalysisJobWaiter::new(OfflineService, &AnalysisConfig::default());

        let err = waiter.submit_and_await(&stored(), &CancelToken::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::Transport(TransportError::Auth(_))));

        let inline = DocumentLocation::Inline(vec![1, 2, 3]);
        let err = waiter.submit_and_await(&inline, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::Transport(TransportError::Request(_))));
    }

    #[test]
    fn test_inline_documents_skip_polling() {
        let service = RecordedAnalysisService::new(vec![JobStatusResponse::succeeded(vec![document(1)])]);
        let waiter = waiter(service);

        let documents = waiter
            .submit_and_await(&DocumentLocation::Inline(b"png".to_vec()), &CancelToken::new())
            .unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(waiter.service().status_checks(), 0);
    }
}
