//! Read-only queries over the public job catalog.

use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{JobPosting, JobPostingDetail, JobPostingSummary};
use crate::repositories::{JobApplicationRepository, JobPostingRepository};

/// Service answering catalog reads for candidates.
#[derive(Clone)]
pub struct CatalogService {
    postings: Arc<dyn JobPostingRepository>,
    applications: Arc<dyn JobApplicationRepository>,
}

impl CatalogService {
    pub fn new(
        postings: Arc<dyn JobPostingRepository>,
        applications: Arc<dyn JobApplicationRepository>,
    ) -> Self {
        Self {
            postings,
            applications,
        }
    }

    /// Postings in RECEIVED or PUBLISHED status, newest first.
    pub async fn list_open(&self) -> AppResult<Vec<JobPostingSummary>> {
        self.postings.list_open().await
    }

    /// A single posting in any status.
    ///
    /// # Errors
    /// `NotFound` when no posting has this id.
    pub async fn get_posting(&self, job_id: &str) -> AppResult<JobPosting> {
        self.postings
            .find(job_id)
            .await?
            .ok_or_else(|| AppError::not_found("job posting", "job_id", job_id))
    }

    /// A posting with the number of applications submitted against it.
    ///
    /// # Errors
    /// `NotFound` when no posting has this id.
    pub async fn get_detail(&self, job_id: &str) -> AppResult<JobPostingDetail> {
        let posting = self.get_posting(job_id).await?;
        let application_count = self.applications.count_for_job(job_id).await?;

        Ok(JobPostingDetail {
            posting,
            application_count,
        })
    }

    /// Readiness check against the backing store.
    pub async fn ping(&self) -> AppResult<()> {
        self.postings.ping().await
    }
}
