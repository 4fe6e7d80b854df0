//! Orchestration engine capability and its Camunda REST implementation.

use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::error::EngineError;
use crate::config::EngineConfig;

/// A task leased from the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivatedTask {
    /// Engine-assigned key, opaque to the worker
    pub key: String,
    pub task_type: String,
    pub process_instance_key: Option<String>,
    /// Retries left before the engine raises an incident
    pub retries: i32,
    /// End of the lease
    pub deadline: Timestamp,
    pub variables: Value,
}

impl ActivatedTask {
    /// Time left on the lease, `None` once it has expired.
    pub fn remaining_lease(&self, now: Timestamp) -> Option<Duration> {
        Duration::try_from(self.deadline.duration_since(now))
            .ok()
            .filter(|remaining| !remaining.is_zero())
    }
}

/// Parameters of one activation (lease) call.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationRequest {
    pub task_type: String,
    pub worker: String,
    pub max_tasks: u32,
    pub lease_timeout: Duration,
    /// How long the engine may hold the call open waiting for tasks
    pub request_timeout: Duration,
}

/// A failed attempt reported back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure {
    /// Retries left after this failure; zero raises an incident
    pub retries: i32,
    pub error_message: String,
    pub retry_backoff: Duration,
}

/// Operations the worker needs from the orchestration engine.
#[async_trait]
pub trait EngineClient: Send + Sync {
    async fn activate(&self, request: &ActivationRequest)
    -> Result<Vec<ActivatedTask>, EngineError>;

    async fn complete(&self, key: &str, variables: Value) -> Result<(), EngineError>;

    async fn fail(&self, key: &str, failure: TaskFailure) -> Result<(), EngineError>;

    /// Stop retrying and surface the task to an operator.
    async fn raise_incident(&self, key: &str, message: &str) -> Result<(), EngineError>;
}

/// [`EngineClient`] over the Camunda 8 REST API (`/v2/jobs/...`).
#[derive(Clone)]
pub struct CamundaRestClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl CamundaRestClient {
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("hireflow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let request = self.client.post(format!("{}{}", self.base_url, path));
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send_report<B: Serialize + Sync>(
        &self,
        operation: &'static str,
        key: &str,
        body: &B,
    ) -> Result<(), EngineError> {
        let path = format!("/v2/jobs/{}/{}", key, operation);
        let response = self.post(&path).json(body).send().await?;

        match response.status() {
            status if status.is_success() => {
                debug!(task_key = key, operation, "Engine accepted report");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(EngineError::NotFound {
                key: key.to_string(),
            }),
            status => Err(EngineError::Rejected {
                operation,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

#[async_trait]
impl EngineClient for CamundaRestClient {
    async fn activate(
        &self,
        request: &ActivationRequest,
    ) -> Result<Vec<ActivatedTask>, EngineError> {
        let body = ActivationBody {
            job_type: &request.task_type,
            worker: &request.worker,
            timeout: duration_ms(request.lease_timeout),
            max_jobs_to_activate: request.max_tasks,
            request_timeout: duration_ms(request.request_timeout),
        };

        let response = self
            .post("/v2/jobs/activation")
            .timeout(request.request_timeout + Duration::from_secs(10))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Rejected {
                operation: "activation",
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let activated: ActivationResponse = response.json().await?;
        activated
            .jobs
            .into_iter()
            .map(ActivatedTask::try_from)
            .collect()
    }

    async fn complete(&self, key: &str, variables: Value) -> Result<(), EngineError> {
        self.send_report("completion", key, &CompletionBody { variables })
            .await
    }

    async fn fail(&self, key: &str, failure: TaskFailure) -> Result<(), EngineError> {
        let body = FailureBody {
            retries: failure.retries.max(0),
            error_message: failure.error_message,
            retry_back_off: duration_ms(failure.retry_backoff),
        };
        self.send_report("failure", key, &body).await
    }

    async fn raise_incident(&self, key: &str, message: &str) -> Result<(), EngineError> {
        // A failure with no retries left makes the engine raise the incident
        let body = FailureBody {
            retries: 0,
            error_message: message.to_string(),
            retry_back_off: 0,
        };
        self.send_report("failure", key, &body).await
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivationBody<'a> {
    #[serde(rename = "type")]
    job_type: &'a str,
    worker: &'a str,
    timeout: u64,
    max_jobs_to_activate: u32,
    request_timeout: u64,
}

#[derive(Debug, Serialize)]
struct CompletionBody {
    variables: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureBody {
    retries: i32,
    error_message: String,
    retry_back_off: u64,
}

#[derive(Debug, Deserialize)]
struct ActivationResponse {
    #[serde(default)]
    jobs: Vec<WireJob>,
}

/// Keys are int64 values that newer engine versions send as strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireKey {
    Text(String),
    Number(i64),
}

impl WireKey {
    fn into_string(self) -> String {
        match self {
            WireKey::Text(text) => text,
            WireKey::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireJob {
    job_key: WireKey,
    #[serde(rename = "type")]
    job_type: String,
    process_instance_key: Option<WireKey>,
    retries: i32,
    /// Epoch milliseconds
    deadline: i64,
    #[serde(default)]
    variables: Value,
}

impl TryFrom<WireJob> for ActivatedTask {
    type Error = EngineError;

    fn try_from(job: WireJob) -> Result<Self, Self::Error> {
        let deadline =
            Timestamp::from_millisecond(job.deadline).map_err(|e| EngineError::Decode {
                message: format!("invalid deadline {}: {}", job.deadline, e),
            })?;

        Ok(Self {
            key: job.job_key.into_string(),
            task_type: job.job_type,
            process_instance_key: job.process_instance_key.map(WireKey::into_string),
            retries: job.retries,
            deadline,
            variables: job.variables,
        })
    }
}
