//! Task handlers invoked by the worker.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use super::engine::ActivatedTask;
use super::error::TaskError;
use crate::models::{PostingData, PublishOutcome};
use crate::services::PostingService;

/// Variables returned to the process on completion.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutput {
    pub variables: Value,
}

impl TaskOutput {
    pub fn empty() -> Self {
        Self {
            variables: Value::Object(Default::default()),
        }
    }
}

/// Business logic for one task type.
///
/// Returning `Ok` means the work is durable; the worker reports completion
/// only after that.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: &ActivatedTask) -> Result<TaskOutput, TaskError>;
}

/// Handles `publish_job_posting_online` by publishing the posting carried in
/// the `hiringRequest` variable.
#[derive(Clone)]
pub struct PublishJobPostingHandler {
    postings: PostingService,
}

impl PublishJobPostingHandler {
    pub fn new(postings: PostingService) -> Self {
        Self { postings }
    }
}

#[async_trait]
impl TaskHandler for PublishJobPostingHandler {
    async fn handle(&self, task: &ActivatedTask) -> Result<TaskOutput, TaskError> {
        let request = hiring_request(&task.variables);
        let job_id = job_id(&request)
            .ok_or_else(|| TaskError::permanent("hiringRequest has no job_id"))?;

        let data = PostingData::from_document(&request);
        let outcome = self.postings.publish(&job_id, &data).await?;

        match outcome {
            PublishOutcome::Rejected { reason, .. } => Err(TaskError::permanent(format!(
                "Job posting '{}' cannot be published: {}",
                job_id, reason
            ))),
            outcome => {
                info!(
                    task_key = %task.key,
                    job_id = %job_id,
                    outcome = outcome.as_str(),
                    "Publish task handled"
                );
                Ok(TaskOutput {
                    variables: json!({
                        "jobPostingStatus": outcome.resulting_status().as_str(),
                        "alreadyPublished": outcome == PublishOutcome::AlreadyPublished,
                    }),
                })
            }
        }
    }
}

/// The `hiringRequest` document, or the root variables when it is absent.
///
/// Some process versions send the request serialized as a JSON string.
fn hiring_request(variables: &Value) -> Value {
    match variables.get("hiringRequest") {
        Some(request @ Value::Object(_)) => request.clone(),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(parsed @ Value::Object(_)) => parsed,
            _ => variables.clone(),
        },
        _ => variables.clone(),
    }
}

fn job_id(request: &Value) -> Option<String> {
    match request.get("job_id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
