//! Job posting repository for async database operations.
//!
//! Provides the publish and close transitions and catalog reads over the
//! job_profiles table.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::{JobPostingRepository, posting_not_found};
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    JobPosting, JobPostingRow, JobPostingSummary, JobPostingSummaryRow, NewJobPostingRow,
    PostingData, PostingStatus, PublishOutcome,
};
use crate::schema::job_profiles;

/// Job posting repository
#[derive(Clone)]
pub struct PgJobPostingRepository {
    pool: AsyncDbPool,
}

impl PgJobPostingRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobPostingRepository for PgJobPostingRepository {
    async fn publish(&self, job_id: &str, data: &PostingData) -> AppResult<PublishOutcome> {
        let new_row = NewJobPostingRow::received(job_id, data);
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                diesel::insert_into(job_profiles::table)
                    .values(&new_row)
                    .on_conflict(job_profiles::job_id)
                    .do_nothing()
                    .execute(conn)
                    .await?;

                let current: PostingStatus = job_profiles::table
                    .filter(job_profiles::job_id.eq(job_id))
                    .select(job_profiles::status)
                    .for_update()
                    .get_result(conn)
                    .await?;

                let outcome = PublishOutcome::for_current_status(current);
                if outcome == PublishOutcome::Published {
                    diesel::update(job_profiles::table.filter(job_profiles::job_id.eq(job_id)))
                        .set(job_profiles::status.eq(PostingStatus::Published))
                        .execute(conn)
                        .await?;
                }

                Ok(outcome)
            }
            .scope_boxed()
        })
        .await
    }

    async fn transition(&self, job_id: &str, next: PostingStatus) -> AppResult<PostingStatus> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let current: PostingStatus = job_profiles::table
                    .filter(job_profiles::job_id.eq(job_id))
                    .select(job_profiles::status)
                    .for_update()
                    .get_result(conn)
                    .await
                    .optional()?
                    .ok_or_else(|| posting_not_found(job_id))?;

                current.ensure_transition(job_id, next)?;

                diesel::update(job_profiles::table.filter(job_profiles::job_id.eq(job_id)))
                    .set(job_profiles::status.eq(next))
                    .execute(conn)
                    .await?;

                Ok(current)
            }
            .scope_boxed()
        })
        .await
    }

    async fn list_open(&self) -> AppResult<Vec<JobPostingSummary>> {
        let mut conn = self.pool.get().await?;

        let rows = job_profiles::table
            .filter(
                job_profiles::status
                    .eq(PostingStatus::Received)
                    .or(job_profiles::status.eq(PostingStatus::Published)),
            )
            .order((job_profiles::created_at.desc(), job_profiles::job_id.asc()))
            .select(JobPostingSummaryRow::as_select())
            .load(&mut conn)
            .await?;

        Ok(rows.into_iter().map(JobPostingSummary::from).collect())
    }

    async fn find(&self, job_id: &str) -> AppResult<Option<JobPosting>> {
        let mut conn = self.pool.get().await?;

        let row = job_profiles::table
            .filter(job_profiles::job_id.eq(job_id))
            .select(JobPostingRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(row.map(JobPosting::from))
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| AppError::Database {
                operation: "ping".to_string(),
                source: anyhow::Error::from(e),
            })
    }
}
