//! Dispatches a parsed command to its handler

use super::handlers::{
    CloseCommandHandler, MigrateCommandHandler, ServeCommandHandler, WorkerCommandHandler,
};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::AppResult;

/// Run the command in `cli` with already merged settings
///
/// No subcommand means `serve` with its defaults.
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => {
            ServeCommandHandler::new(settings).execute(*dry_run).await
        }
        None => ServeCommandHandler::new(settings).execute(false).await,
        Some(Commands::Worker { dry_run }) => {
            WorkerCommandHandler::new(settings).execute(*dry_run).await
        }
        Some(Commands::Close { job_id }) => CloseCommandHandler::new(settings).execute(job_id).await,
        Some(Commands::Migrate { dry_run, rollback }) => {
            MigrateCommandHandler::new(settings)
                .execute(*dry_run, *rollback)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use clap::Parser;

    fn valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/hireflow".to_string();
        config
    }

    #[tokio::test]
    async fn test_execute_serve_dry_run() {
        let cli = Cli::try_parse_from(["hireflow", "serve", "--dry-run"]).unwrap();
        assert!(execute_command(&cli, valid_config()).await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_worker_dry_run() {
        let cli = Cli::try_parse_from(["hireflow", "worker", "--dry-run"]).unwrap();
        assert!(execute_command(&cli, valid_config()).await.is_ok());
    }

    #[tokio::test]
    async fn test_execute_migrate_requires_database_url() {
        let cli = Cli::try_parse_from(["hireflow", "migrate", "--dry-run"]).unwrap();
        let result = execute_command(&cli, Settings::default()).await;
        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }
}
