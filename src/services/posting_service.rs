//! Job posting lifecycle operations.
//!
//! Owns the posting state machine: the idempotent publish driven by the task
//! worker and the close transition.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{PostingData, PostingStatus, PublishOutcome};
use crate::repositories::JobPostingRepository;

/// Service for job posting state transitions.
///
/// Cloning is cheap; the repository is shared behind an `Arc`.
#[derive(Clone)]
pub struct PostingService {
    postings: Arc<dyn JobPostingRepository>,
}

impl PostingService {
    pub fn new(postings: Arc<dyn JobPostingRepository>) -> Self {
        Self { postings }
    }

    /// Publish a posting received from the hiring process.
    ///
    /// Safe to call any number of times for the same `job_id`: only the first
    /// call moves the posting to PUBLISHED, later calls report
    /// `AlreadyPublished`. Closed or rejected postings are never reopened.
    ///
    /// # Errors
    /// `Validation` when `job_id` is blank, or any repository error.
    pub async fn publish(&self, job_id: &str, data: &PostingData) -> AppResult<PublishOutcome> {
        let job_id = job_id.trim();
        if job_id.is_empty() {
            return Err(AppError::Validation {
                field: "job_id".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let defaulted = data.structured.defaulted_fields();
        if !defaulted.is_empty() {
            warn!(
                job_id,
                fields = ?defaulted,
                "Structured fields missing or malformed, storing defaults"
            );
        }

        let outcome = self.postings.publish(job_id, data).await?;

        match &outcome {
            PublishOutcome::Rejected { status, reason } => {
                warn!(job_id, status = %status, reason = %reason, outcome = outcome.as_str(), "Publish rejected");
            }
            _ => {
                info!(job_id, outcome = outcome.as_str(), "Job posting publish handled");
            }
        }

        Ok(outcome)
    }

    /// Close a published posting so it leaves the catalog.
    ///
    /// # Errors
    /// `NotFound` when the posting does not exist, `Conflict` when it is not
    /// currently PUBLISHED.
    pub async fn close(&self, job_id: &str) -> AppResult<()> {
        let previous = self.postings.transition(job_id, PostingStatus::Closed).await?;
        info!(job_id, previous = %previous, "Job posting closed");
        Ok(())
    }
}
