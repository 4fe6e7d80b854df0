use std::error::Error as StdError;

use thiserror::Error;

use crate::error::AppError;

/// Failure of a task handler, classified for the engine report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// May succeed on redelivery; reported as a failure with retries.
    #[error("{message}")]
    Transient { message: String },

    /// Will not succeed on redelivery; reported as an incident.
    #[error("{message}")]
    Permanent { message: String },
}

impl TaskError {
    pub fn transient(message: impl Into<String>) -> Self {
        TaskError::Transient {
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        TaskError::Permanent {
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, TaskError::Transient { .. })
    }
}

impl From<AppError> for TaskError {
    fn from(error: AppError) -> Self {
        let message = error_chain(&error);
        if error.is_transient() {
            TaskError::Transient { message }
        } else {
            TaskError::Permanent { message }
        }
    }
}

/// Errors talking to the orchestration engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine no longer knows the task, usually because its lease expired.
    #[error("Task {key} not found on the engine")]
    NotFound { key: String },

    #[error("Engine rejected {operation} with status {status}: {body}")]
    Rejected {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Engine request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid engine response: {message}")]
    Decode { message: String },
}

impl From<EngineError> for AppError {
    fn from(error: EngineError) -> Self {
        AppError::engine("engine request", error)
    }
}

/// Render an error with its sources, `outer: inner: root`.
pub(crate) fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
