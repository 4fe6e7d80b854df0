//! Job application repository for async database operations.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::JobApplicationRepository;
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewJobApplication, PostingStatus, SubmitOutcome};
use crate::schema::{job_applications, job_profiles};

/// Job application repository
#[derive(Clone)]
pub struct PgJobApplicationRepository {
    pool: AsyncDbPool,
}

impl PgJobApplicationRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobApplicationRepository for PgJobApplicationRepository {
    async fn submit(&self, application: NewJobApplication) -> AppResult<SubmitOutcome> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                // FOR SHARE keeps the posting from being closed until the insert commits
                let status: Option<PostingStatus> = job_profiles::table
                    .filter(job_profiles::job_id.eq(&application.job_id))
                    .select(job_profiles::status)
                    .for_share()
                    .get_result(conn)
                    .await
                    .optional()?;

                let Some(status) = status else {
                    return Ok(SubmitOutcome::JobNotFound);
                };
                if !status.accepts_applications() {
                    return Ok(SubmitOutcome::PostingClosed { status });
                }

                let application_id: i64 = diesel::insert_into(job_applications::table)
                    .values(&application)
                    .returning(job_applications::id)
                    .get_result(conn)
                    .await?;

                Ok(SubmitOutcome::Accepted { application_id })
            }
            .scope_boxed()
        })
        .await
    }

    async fn count_for_job(&self, job_id: &str) -> AppResult<i64> {
        let mut conn = self.pool.get().await?;

        job_applications::table
            .filter(job_applications::job_id.eq(job_id))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }
}
