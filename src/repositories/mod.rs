//! Repository layer for data access operations.
//!
//! Each store is an async trait with a PostgreSQL implementation and an
//! in-memory implementation. Services depend on the traits only.

mod job_application_repo;
mod job_posting_repo;
mod memory_store;

pub use job_application_repo::PgJobApplicationRepository;
pub use job_posting_repo::PgJobPostingRepository;
pub use memory_store::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    JobPosting, JobPostingSummary, NewJobApplication, PostingData, PostingStatus, PublishOutcome,
    SubmitOutcome,
};

/// Storage of job postings and their lifecycle transitions.
#[async_trait]
pub trait JobPostingRepository: Send + Sync {
    /// Idempotently publish a posting within one transaction.
    ///
    /// Inserts the posting as RECEIVED when absent, locks it, then applies
    /// [`PublishOutcome::for_current_status`]. Concurrent calls for one id
    /// serialize on the row lock.
    async fn publish(&self, job_id: &str, data: &PostingData) -> AppResult<PublishOutcome>;

    /// Move a posting to `next`, returning the status it had before.
    ///
    /// Fails with `NotFound` when absent and `Conflict` when the transition
    /// is invalid.
    async fn transition(&self, job_id: &str, next: PostingStatus) -> AppResult<PostingStatus>;

    /// Open postings, newest first.
    async fn list_open(&self) -> AppResult<Vec<JobPostingSummary>>;

    async fn find(&self, job_id: &str) -> AppResult<Option<JobPosting>>;

    /// Round-trip to the store, used by readiness probes.
    async fn ping(&self) -> AppResult<()>;
}

/// Storage of candidate applications.
#[async_trait]
pub trait JobApplicationRepository: Send + Sync {
    /// Check the target posting and insert the application in one transaction.
    async fn submit(&self, application: NewJobApplication) -> AppResult<SubmitOutcome>;

    async fn count_for_job(&self, job_id: &str) -> AppResult<i64>;
}

/// Aggregates all repositories for convenient access.
///
/// Cloning is cheap; both handles are reference counted.
#[derive(Clone)]
pub struct Repositories {
    pub postings: Arc<dyn JobPostingRepository>,
    pub applications: Arc<dyn JobApplicationRepository>,
}

impl Repositories {
    /// Repositories backed by PostgreSQL through the given pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            postings: Arc::new(PgJobPostingRepository::new(pool.clone())),
            applications: Arc::new(PgJobApplicationRepository::new(pool)),
        }
    }

    /// Repositories sharing one in-memory store.
    pub fn in_memory(store: MemoryStore) -> Self {
        Self {
            postings: Arc::new(store.clone()),
            applications: Arc::new(store),
        }
    }
}

fn posting_not_found(job_id: &str) -> AppError {
    AppError::not_found("JobPosting", "job_id", job_id)
}
