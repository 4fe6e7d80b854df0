//! External task worker for the orchestration engine.
//!
//! [`TaskWorker`] leases tasks through an [`EngineClient`], runs them through
//! the handler registered for their type and reports completion, a retryable
//! failure or an incident back to the engine.

pub mod engine;
mod error;
mod handler;
mod registry;
mod retry;
mod runner;

#[cfg(test)]
mod tests;

pub use engine::{ActivatedTask, ActivationRequest, CamundaRestClient, EngineClient, TaskFailure};
pub use error::{EngineError, TaskError};
pub use handler::{PublishJobPostingHandler, TaskHandler, TaskOutput};
pub use registry::HandlerRegistry;
pub use retry::RetryPolicy;
pub use runner::{DispatchOutcome, Dispatcher, TaskWorker};

/// Task type published by the hiring process for new postings.
pub const PUBLISH_JOB_POSTING_TASK: &str = "publish_job_posting_online";
