//! Errors raised while loading and validating hireflow settings

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required file of the layered configuration is missing
    #[error("Required configuration file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// The merged sources do not deserialize into [`Settings`](super::Settings)
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A server, database or logger setting is out of range
    #[error("Validation error: {field} - {message}")]
    ValidationError { field: String, message: String },

    /// An `engine` or `worker` setting prevents the task worker from starting.
    ///
    /// Only raised when the worker is enabled; a catalog-only deployment
    /// never sees it.
    #[error("Task worker cannot start: {field} - {message}")]
    WorkerSetting { field: String, message: String },

    /// `HIREFLOW_APP_ENV` or `--env` names no known environment
    #[error(
        "Invalid environment '{value}'. Valid values are: development, test, staging, production"
    )]
    UnknownEnvironment { value: String },

    /// Two environment variables select incompatible configuration sources
    #[error("{first} and {second} cannot both be set")]
    ConflictingSources {
        first: &'static str,
        second: &'static str,
    },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn worker_setting(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::WorkerSetting {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: &Path) -> Self {
        ConfigError::FileNotFound {
            path: path.to_path_buf(),
        }
    }

    /// Dotted settings key the error refers to, when there is one
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::ValidationError { field, .. } | ConfigError::WorkerSetting { field, .. } => {
                Some(field)
            }
            _ => None,
        }
    }
}
