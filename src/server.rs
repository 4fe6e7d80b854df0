//! Server module for managing HTTP server lifecycle
//!
//! This module handles server initialization, startup, and graceful shutdown.
//! When `worker.enabled` is set the task worker runs inside the same process
//! and shares the shutdown signal with the HTTP listener.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::routes::create_router;
use crate::config::{Environment, settings::Settings};
use crate::db::{establish_async_connection_pool, run_pending_migrations};
use crate::repositories::MemoryStore;
use crate::services::Services;
use crate::state::AppState;
use crate::worker::{CamundaRestClient, HandlerRegistry, TaskWorker};

/// HTTP server manager
pub struct Server {
    settings: Settings,
}

impl Server {
    /// Create a new server with the given settings
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Start the server and run until shutdown signal
    ///
    /// This method:
    /// 1. Logs startup information
    /// 2. Initializes the database pool and applies migrations if configured
    /// 3. Starts the embedded task worker if enabled
    /// 4. Serves HTTP until Ctrl+C or SIGTERM, then drains the worker
    ///
    /// # Errors
    /// - Database connection pool initialization errors
    /// - Engine client construction errors
    /// - Address binding errors
    pub async fn run(self) -> anyhow::Result<()> {
        self.log_configuration();

        let state = self.build_state().await?;
        let shutdown = CancellationToken::new();

        let worker = if self.settings.worker.enabled {
            Some(spawn_worker(&self.settings, &state.services, shutdown.clone())?)
        } else {
            tracing::info!("Task worker disabled");
            None
        };

        let router = create_router(
            state,
            Duration::from_secs(self.settings.server.request_timeout),
        );

        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;

        tracing::info!(address = %address, "Server listening");

        let token = shutdown.clone();
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                token.cancel();
            })
            .await?;

        // The listener may also stop on its own; make sure the worker follows.
        shutdown.cancel();
        if let Some(handle) = worker
            && let Err(e) = handle.await
        {
            tracing::error!(error = %e, "Task worker terminated abnormally");
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// PostgreSQL-backed state, or the in-memory store when
    /// `database.in_memory` is set
    async fn build_state(&self) -> anyhow::Result<AppState> {
        if self.settings.database.in_memory {
            tracing::warn!("Using the in-memory store; postings and applications are lost on exit");
            return Ok(AppState::in_memory(MemoryStore::new()));
        }

        tracing::info!("Initializing database connection pool...");
        let pool = establish_async_connection_pool(&self.settings.database).await?;
        tracing::info!("Database connection pool initialized");

        if self.settings.database.auto_migrate {
            let applied = run_pending_migrations(&self.settings.database.url).await?;
            tracing::info!(count = applied.len(), "Pending migrations applied");
        }

        Ok(AppState::new(pool))
    }

    fn log_configuration(&self) {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %Environment::from_env().unwrap_or_default(),
            "Application starting"
        );

        tracing::info!(
            host = %self.settings.server.host,
            port = %self.settings.server.port,
            request_timeout = %self.settings.server.request_timeout,
            keep_alive_timeout = %self.settings.server.keep_alive_timeout,
            "Server configuration loaded"
        );

        // The URL may carry credentials, so it is never logged.
        tracing::info!(
            max_connections = %self.settings.database.max_connections,
            min_connections = %self.settings.database.min_connections,
            connection_timeout = %self.settings.database.connection_timeout,
            auto_migrate = %self.settings.database.auto_migrate,
            in_memory = %self.settings.database.in_memory,
            "Database configuration loaded"
        );

        tracing::info!(
            level = %self.settings.logger.level,
            console_enabled = %self.settings.logger.console.enabled,
            file_enabled = %self.settings.logger.file.enabled,
            "Logger configuration loaded"
        );

        tracing::info!(
            enabled = %self.settings.worker.enabled,
            engine = %self.settings.engine.base_url,
            task_types = ?self.settings.worker.task_types,
            max_in_flight = %self.settings.worker.max_in_flight,
            "Worker configuration loaded"
        );
    }
}

/// Builds the engine client and handler registry, then runs the worker on
/// its own task until `shutdown` is cancelled.
pub fn spawn_worker(
    settings: &Settings,
    services: &Services,
    shutdown: CancellationToken,
) -> anyhow::Result<JoinHandle<()>> {
    settings.validate_worker()?;

    let engine = CamundaRestClient::new(&settings.engine)?;
    let registry = HandlerRegistry::with_defaults(services);
    let worker = TaskWorker::new(Arc::new(engine), registry, settings.worker.clone());

    Ok(tokio::spawn(async move { worker.run(shutdown).await }))
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
///
/// A handler that cannot be installed is logged and never fires; the other
/// signal still stops the process.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
