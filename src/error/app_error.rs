use crate::config::error::ConfigError;
use crate::error::DatabaseErrorConverter;
use axum::extract::rejection::FormRejection;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

/// Application-wide error type that represents all possible errors in the system.
///
/// The same type flows through HTTP handlers (mapped to status codes by the
/// error handler middleware) and task handlers (classified by
/// [`AppError::is_transient`] into retry or incident).
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// Duplicate entry error for unique constraint violations
    #[error("Duplicate entry: {entity}.{field} = '{value}' already exists")]
    Duplicate {
        entity: String,
        field: String,
        value: String,
    },

    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Several field validation failures collected from a request body
    #[error("Validation failed for {} field(s)", errors.len())]
    ValidationErrors { errors: Vec<ValidationFieldError> },

    /// Bad request error with descriptive message
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// The request conflicts with the current state of a resource
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Unprocessable content error with descriptive message
    #[error("Unprocessable content: {message}")]
    UnprocessableContent { message: String },

    /// Database operation error with operation context
    #[error("Database operation failed: {operation}")]
    Database {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// Orchestration engine call failed
    #[error("Orchestration engine call failed: {operation}")]
    Engine {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Connection pool error
    #[error("Connection pool error")]
    ConnectionPool {
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Whether retrying the same operation later can succeed.
    ///
    /// Infrastructure failures (pool exhaustion, lost connections, engine
    /// outages) are transient; client and state errors are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Database { .. } | AppError::Engine { .. } | AppError::ConnectionPool { .. }
        )
    }

    pub fn not_found(entity: &str, field: &str, value: impl Into<String>) -> Self {
        AppError::NotFound {
            entity: entity.to_string(),
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn engine(operation: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        AppError::Engine {
            operation: operation.into(),
            source: source.into(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(error: diesel::result::Error) -> Self {
        DatabaseErrorConverter::convert_diesel_error(error, "database operation")
    }
}

impl<E> From<bb8::RunError<E>> for AppError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: bb8::RunError<E>) -> Self {
        AppError::ConnectionPool {
            source: anyhow::Error::from(error),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = error.field().unwrap_or("settings").to_string();
        AppError::Configuration {
            key,
            source: anyhow::Error::from(error),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut collected: Vec<ValidationFieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |e| ValidationFieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code)),
                })
            })
            .collect();
        collected.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::ValidationErrors { errors: collected }
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let db = AppError::Database {
            operation: "publish".to_string(),
            source: anyhow::anyhow!("connection reset"),
        };
        let pool = AppError::ConnectionPool {
            source: anyhow::anyhow!("timed out"),
        };
        let engine = AppError::engine("complete task", anyhow::anyhow!("503"));

        assert!(db.is_transient());
        assert!(pool.is_transient());
        assert!(engine.is_transient());
    }

    #[test]
    fn test_client_errors_are_not_transient() {
        assert!(!AppError::not_found("JobPosting", "job_id", "J-1").is_transient());
        assert!(
            !AppError::Conflict {
                message: "closed".to_string()
            }
            .is_transient()
        );
        assert!(
            !AppError::Validation {
                field: "job_id".to_string(),
                reason: "missing".to_string()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_not_found_message() {
        let error = AppError::not_found("JobPosting", "job_id", "J-404");
        assert_eq!(
            error.to_string(),
            "Resource not found: JobPosting with job_id=J-404"
        );
    }

    #[test]
    fn test_config_error_keeps_the_settings_key() {
        let worker: AppError = ConfigError::worker_setting("engine.base_url", "empty").into();
        assert!(matches!(worker, AppError::Configuration { ref key, .. } if key == "engine.base_url"));

        let parse: AppError = ConfigError::ParseError("bad toml".to_string()).into();
        assert!(matches!(parse, AppError::Configuration { ref key, .. } if key == "settings"));
    }
}
