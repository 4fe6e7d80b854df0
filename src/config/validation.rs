//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use crate::config::error::ConfigError;
use crate::config::settings::{
    DatabaseConfig, EngineConfig, FileSettings, LoggerSettings, ServerConfig, Settings,
    WorkerConfig,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    /// - Keep-alive timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        if self.keep_alive_timeout == 0 {
            return Err(ConfigError::validation(
                "server.keep_alive_timeout",
                "Keep-alive timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// # Validation Rules
    /// - URL must be a PostgreSQL connection string
    /// - Pool sizes must be positive with min <= max
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required. Please specify a valid database connection string.",
            ));
        }

        if !self.url.starts_with("postgres://") && !self.url.starts_with("postgresql://") {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections == 0 {
            return Err(ConfigError::validation(
                "database.min_connections",
                "Min connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::validation(
                "database.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl EngineConfig {
    /// Validate engine connection settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::WorkerSetting {
                field: "engine.base_url".to_string(),
                message: format!(
                    "Engine URL '{}' must start with http:// or https://",
                    self.base_url
                ),
            });
        }

        if self
            .auth_token
            .as_deref()
            .is_some_and(|token| token.trim().is_empty())
        {
            return Err(ConfigError::worker_setting(
                "engine.auth_token",
                "Auth token must not be blank; omit it to disable authentication.",
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err(ConfigError::worker_setting(
                "engine.request_timeout_ms",
                "Request timeout must be greater than 0 milliseconds.",
            ));
        }

        Ok(())
    }
}

impl WorkerConfig {
    /// Validate worker settings
    ///
    /// # Validation Rules
    /// - At least one task type, no blank names
    /// - Batch size, lease, and concurrency must be positive
    /// - Retry backoff must not shrink (`multiplier >= 1`) and `max >= base`
    /// - Retry budget must not be negative
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::worker_setting(
                "worker.name",
                "Worker name must not be empty.",
            ));
        }

        if self.task_types.is_empty() || self.task_types.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::worker_setting(
                "worker.task_types",
                "At least one non-empty task type is required.",
            ));
        }

        if self.max_tasks_per_poll == 0 {
            return Err(ConfigError::worker_setting(
                "worker.max_tasks_per_poll",
                "Max tasks per poll must be greater than 0.",
            ));
        }

        if self.lease_timeout_ms == 0 {
            return Err(ConfigError::worker_setting(
                "worker.lease_timeout_ms",
                "Lease timeout must be greater than 0 milliseconds.",
            ));
        }

        if self.max_in_flight == 0 {
            return Err(ConfigError::worker_setting(
                "worker.max_in_flight",
                "Max in-flight tasks must be greater than 0.",
            ));
        }

        if !self.retry_backoff_multiplier.is_finite() || self.retry_backoff_multiplier < 1.0 {
            return Err(ConfigError::WorkerSetting {
                field: "worker.retry_backoff_multiplier".to_string(),
                message: format!(
                    "Backoff multiplier must be a finite number >= 1.0, got {}",
                    self.retry_backoff_multiplier
                ),
            });
        }

        if self.retry_backoff_max_ms < self.retry_backoff_base_ms {
            return Err(ConfigError::WorkerSetting {
                field: "worker.retry_backoff_max_ms".to_string(),
                message: format!(
                    "Max backoff ({}ms) cannot be lower than the base backoff ({}ms).",
                    self.retry_backoff_max_ms, self.retry_backoff_base_ms
                ),
            });
        }

        if self.max_retries < 0 {
            return Err(ConfigError::worker_setting(
                "worker.max_retries",
                "Max retries cannot be negative.",
            ));
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// The level may carry per-target directives (`info,hireflow::worker=debug`);
    /// only the target-less default directive is checked here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let default_level = self
            .level
            .split(',')
            .map(str::trim)
            .find(|directive| !directive.contains('='))
            .unwrap_or("info");

        if !VALID_LOG_LEVELS.contains(&default_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        self.file.validate()?;

        Ok(())
    }
}

impl Settings {
    /// Validate all configuration settings
    ///
    /// Returns the first validation error encountered. The engine section is
    /// only checked when something will talk to the engine; see
    /// [`Settings::validate_worker`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        if !self.database.in_memory {
            self.database.validate()?;
        }
        self.logger.validate()?;
        if self.worker.enabled {
            self.validate_worker()?;
        }
        Ok(())
    }

    /// Validate the sections required to run the task worker
    pub fn validate_worker(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.worker.validate()
    }
}
