//! Close command handler
//!
//! Takes a published posting out of the catalog. The engine only ever
//! publishes, so closing is an operator action.

use crate::config::settings::Settings;
use crate::db::establish_async_connection_pool;
use crate::error::AppResult;
use crate::repositories::Repositories;
use crate::services::PostingService;

pub struct CloseCommandHandler {
    config: Settings,
}

impl CloseCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub async fn execute(&self, job_id: &str) -> AppResult<()> {
        self.config.database.validate()?;

        let pool = establish_async_connection_pool(&self.config.database).await?;
        let postings = PostingService::new(Repositories::new(pool).postings);
        close_posting(&postings, job_id).await
    }
}

async fn close_posting(postings: &PostingService, job_id: &str) -> AppResult<()> {
    postings.close(job_id).await?;
    println!("Job posting '{job_id}' closed");
    Ok(())
}
