//! Worker command handler
//!
//! Runs the task worker against PostgreSQL without the HTTP listener.

use tokio_util::sync::CancellationToken;

use crate::config::error::ConfigError;
use crate::config::settings::Settings;
use crate::db::establish_async_connection_pool;
use crate::error::{AppError, AppResult};
use crate::repositories::Repositories;
use crate::server::{shutdown_signal, spawn_worker};
use crate::services::Services;

pub struct WorkerCommandHandler {
    config: Settings,
}

impl WorkerCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Run until Ctrl+C or SIGTERM, then let in-flight tasks finish
    pub async fn execute(self, dry_run: bool) -> AppResult<()> {
        // A standalone worker would publish into a store nobody else can read.
        if self.config.database.in_memory {
            return Err(ConfigError::validation(
                "database.in_memory",
                "The standalone worker needs PostgreSQL; use `serve --in-memory --with-worker`",
            )
            .into());
        }
        self.config.database.validate()?;
        self.config.validate_worker()?;

        if dry_run {
            println!("Worker configuration is valid");
            println!(
                "Worker '{}' would poll {} for {:?}",
                self.config.worker.name,
                self.config.engine.base_url,
                self.config.worker.task_types
            );
            return Ok(());
        }

        let pool = establish_async_connection_pool(&self.config.database).await?;
        let services = Services::new(Repositories::new(pool));

        let shutdown = CancellationToken::new();
        let handle = spawn_worker(&self.config, &services, shutdown.clone())?;

        shutdown_signal().await;
        shutdown.cancel();

        handle.await.map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;
        tracing::info!("Worker shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/hireflow".to_string();
        config
    }

    #[tokio::test]
    async fn test_dry_run_with_valid_config() {
        assert!(WorkerCommandHandler::new(valid_config()).execute(true).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_in_memory_store() {
        let mut config = valid_config();
        config.database.in_memory = true;

        match WorkerCommandHandler::new(config).execute(true).await {
            Err(AppError::Configuration { key, .. }) => assert_eq!(key, "database.in_memory"),
            other => panic!("Expected configuration error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dry_run_rejects_empty_task_types() {
        let mut config = valid_config();
        config.worker.task_types.clear();

        match WorkerCommandHandler::new(config).execute(true).await {
            Err(AppError::Configuration { key, .. }) => assert_eq!(key, "worker.task_types"),
            other => panic!("Expected configuration error, got {other:?}"),
        }
    }
}
