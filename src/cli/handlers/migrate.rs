//! Migrate command handler
//!
//! Applies, previews or rolls back the embedded migrations. The migration
//! harness is synchronous, so every operation runs on a blocking
//! `PgConnection`.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::MigrationHarness;

use crate::config::settings::Settings;
use crate::db::{MIGRATIONS, run_pending_migrations};
use crate::error::{AppError, AppResult};

pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Run the migrate command
    ///
    /// `dry_run` lists pending migrations; `rollback` reverts that many of
    /// the most recently applied ones. With neither, pending migrations are
    /// applied.
    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        if let Some(0) = rollback {
            return Err(AppError::Validation {
                field: "rollback_steps".to_string(),
                reason: "Number of rollback steps must be greater than 0".to_string(),
            });
        }

        self.config.database.validate()?;

        match (dry_run, rollback) {
            (true, _) => self.show_pending_migrations().await,
            (false, Some(steps)) => self.rollback_migrations(steps).await,
            (false, None) => self.run_migrations().await,
        }
    }

    async fn show_pending_migrations(&self) -> AppResult<()> {
        let pending = with_connection(&self.config.database.url, |conn| {
            let pending = conn
                .pending_migrations(MIGRATIONS)
                .map_err(|e| migration_error("check pending migrations", e))?;
            Ok(pending.iter().map(|m| m.name().to_string()).collect::<Vec<_>>())
        })
        .await?;

        if pending.is_empty() {
            println!("No pending migrations; database is up to date");
        } else {
            println!("Found {} pending migration(s):", pending.len());
            for name in &pending {
                println!("  - {name}");
            }
            println!("\nRun without --dry-run to apply them");
        }

        Ok(())
    }

    async fn run_migrations(&self) -> AppResult<()> {
        let applied = run_pending_migrations(&self.config.database.url).await?;

        if applied.is_empty() {
            println!("No migrations to apply; database is up to date");
        } else {
            println!("Applied {} migration(s):", applied.len());
            for version in &applied {
                println!("  - {version}");
            }
        }
        tracing::info!(count = applied.len(), "Migrations applied");

        Ok(())
    }

    async fn rollback_migrations(&self, steps: u32) -> AppResult<()> {
        let reverted = with_connection(&self.config.database.url, move |conn| {
            let applied = conn
                .applied_migrations()
                .map_err(|e| migration_error("list applied migrations", e))?;

            if applied.len() < steps as usize {
                return Err(AppError::Validation {
                    field: "rollback_steps".to_string(),
                    reason: format!(
                        "Cannot roll back {} migration(s); only {} applied",
                        steps,
                        applied.len()
                    ),
                });
            }

            (0..steps)
                .map(|_| {
                    conn.revert_last_migration(MIGRATIONS)
                        .map(|version| version.to_string())
                        .map_err(|e| migration_error("revert migration", e))
                })
                .collect::<AppResult<Vec<_>>>()
        })
        .await?;

        println!("Rolled back {} migration(s):", reverted.len());
        for version in &reverted {
            println!("  - {version}");
        }
        tracing::info!(count = reverted.len(), "Migrations rolled back");

        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

async fn with_connection<T, F>(database_url: &str, op: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> AppResult<T> + Send + 'static,
{
    let database_url = database_url.to_string();

    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&database_url).map_err(|e| AppError::Database {
            operation: "establish connection for migrations".to_string(),
            source: anyhow::Error::from(e),
        })?;
        op(&mut conn)
    })
    .await
    .map_err(|e| AppError::Internal {
        source: anyhow::Error::from(e),
    })?
}

fn migration_error(operation: &str, error: impl std::fmt::Display) -> AppError {
    AppError::Database {
        operation: operation.to_string(),
        source: anyhow::anyhow!("Migration error: {}", error),
    }
}
