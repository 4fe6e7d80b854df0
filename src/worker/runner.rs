//! Polling loop and per-task dispatch.

use std::sync::Arc;
use std::time::Duration;

use jiff::Timestamp;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::engine::{ActivatedTask, ActivationRequest, EngineClient, TaskFailure};
use super::error::{EngineError, TaskError, error_chain};
use super::registry::HandlerRegistry;
use super::retry::RetryPolicy;
use crate::config::WorkerConfig;

/// What the dispatcher did with one task.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Completed,
    /// Reported as failed; the engine retries after the backoff
    Failed { retries: i32, backoff: Duration },
    IncidentRaised { message: String },
    /// The lease ran out before the handler started
    LeaseExpired,
    /// The handler outlived the lease; nothing reported
    HandlerTimedOut,
    /// The engine no longer knew the task when the outcome was reported
    LeaseLost,
    /// The report itself failed; the engine redelivers once the lease expires
    ReportFailed,
}

/// Runs one leased task through its handler and reports the outcome.
#[derive(Clone)]
pub struct Dispatcher {
    engine: Arc<dyn EngineClient>,
    registry: Arc<HandlerRegistry>,
    retry: RetryPolicy,
    max_retries: i32,
}

impl Dispatcher {
    pub fn new(
        engine: Arc<dyn EngineClient>,
        registry: Arc<HandlerRegistry>,
        retry: RetryPolicy,
        max_retries: i32,
    ) -> Self {
        Self {
            engine,
            registry,
            retry,
            max_retries,
        }
    }

    pub async fn dispatch(&self, task: ActivatedTask) -> DispatchOutcome {
        let span = info_span!(
            "task",
            task_key = %task.key,
            task_type = %task.task_type,
            retries = task.retries,
        );
        self.dispatch_inner(task).instrument(span).await
    }

    async fn dispatch_inner(&self, task: ActivatedTask) -> DispatchOutcome {
        let Some(handler) = self.registry.get(&task.task_type) else {
            let message = format!("No handler registered for task type '{}'", task.task_type);
            return self.incident(&task, message).await;
        };

        let Some(remaining) = task.remaining_lease(Timestamp::now()) else {
            warn!("Lease expired before dispatch, skipping");
            return DispatchOutcome::LeaseExpired;
        };

        let result = match tokio::time::timeout(remaining, handler.handle(&task)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    lease_ms = remaining.as_millis() as u64,
                    "Handler exceeded the lease, leaving the task for redelivery"
                );
                return DispatchOutcome::HandlerTimedOut;
            }
        };

        match result {
            Ok(output) => {
                let reported = self.engine.complete(&task.key, output.variables).await;
                self.reported(reported, "completion", DispatchOutcome::Completed)
            }
            Err(TaskError::Transient { message }) if task.retries > 1 => {
                let retries = task.retries - 1;
                let attempt = u32::try_from(self.max_retries - task.retries).unwrap_or(0);
                let backoff = self.retry.backoff_with_jitter(attempt);
                warn!(
                    error = %message,
                    retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "Task failed, engine will retry"
                );

                let failure = TaskFailure {
                    retries,
                    error_message: message,
                    retry_backoff: backoff,
                };
                let reported = self.engine.fail(&task.key, failure).await;
                self.reported(reported, "failure", DispatchOutcome::Failed { retries, backoff })
            }
            Err(error @ TaskError::Transient { .. }) => {
                let message = format!("Retries exhausted: {}", error);
                self.incident(&task, message).await
            }
            Err(TaskError::Permanent { message }) => self.incident(&task, message).await,
        }
    }

    async fn incident(&self, task: &ActivatedTask, message: String) -> DispatchOutcome {
        error!(error = %message, "Raising incident");
        let reported = self.engine.raise_incident(&task.key, &message).await;
        self.reported(reported, "incident", DispatchOutcome::IncidentRaised { message })
    }

    fn reported(
        &self,
        result: Result<(), EngineError>,
        report: &'static str,
        outcome: DispatchOutcome,
    ) -> DispatchOutcome {
        match result {
            Ok(()) => {
                info!(report, "Task outcome reported");
                outcome
            }
            Err(EngineError::NotFound { .. }) => {
                warn!(report, "Task unknown to the engine, lease was lost");
                DispatchOutcome::LeaseLost
            }
            Err(e) => {
                error!(report, error = %error_chain(&e), "Failed to report task outcome");
                DispatchOutcome::ReportFailed
            }
        }
    }
}

/// Long-running worker leasing tasks and dispatching them concurrently.
pub struct TaskWorker {
    engine: Arc<dyn EngineClient>,
    dispatcher: Dispatcher,
    config: WorkerConfig,
}

impl TaskWorker {
    pub fn new(
        engine: Arc<dyn EngineClient>,
        registry: HandlerRegistry,
        config: WorkerConfig,
    ) -> Self {
        let dispatcher = Dispatcher::new(
            engine.clone(),
            Arc::new(registry),
            RetryPolicy::from_config(&config),
            config.max_retries,
        );
        Self {
            engine,
            dispatcher,
            config,
        }
    }

    /// Poll until `shutdown` is cancelled, then wait for in-flight tasks.
    ///
    /// Each in-flight task is bounded by its own lease, so draining ends.
    pub async fn run(&self, shutdown: CancellationToken) {
        let slots = Arc::new(Semaphore::new(self.config.max_in_flight.max(1)));
        let mut in_flight: JoinSet<DispatchOutcome> = JoinSet::new();

        info!(
            worker = %self.config.name,
            task_types = ?self.config.task_types,
            max_in_flight = self.config.max_in_flight,
            "Task worker started"
        );

        'poll: while !shutdown.is_cancelled() {
            while let Some(joined) = in_flight.try_join_next() {
                log_join(joined);
            }

            if slots.available_permits() == 0 {
                tokio::select! {
                    _ = shutdown.cancelled() => break 'poll,
                    Some(joined) = in_flight.join_next() => log_join(joined),
                }
                continue;
            }

            let mut activated = 0usize;
            let mut activation_failed = false;

            for task_type in &self.config.task_types {
                let free = slots.available_permits().min(self.config.max_tasks_per_poll as usize);
                if free == 0 {
                    break;
                }

                let request = ActivationRequest {
                    task_type: task_type.clone(),
                    worker: self.config.name.clone(),
                    max_tasks: free as u32,
                    lease_timeout: self.config.lease_timeout(),
                    request_timeout: self.config.activation_request_timeout(),
                };

                let result = tokio::select! {
                    _ = shutdown.cancelled() => break 'poll,
                    result = self.engine.activate(&request) => result,
                };

                match result {
                    Ok(tasks) => {
                        debug!(task_type = %task_type, count = tasks.len(), "Activated tasks");
                        for task in tasks {
                            let Ok(permit) = slots.clone().acquire_owned().await else {
                                break 'poll;
                            };
                            let dispatcher = self.dispatcher.clone();
                            activated += 1;
                            in_flight.spawn(async move {
                                let outcome = dispatcher.dispatch(task).await;
                                drop(permit);
                                outcome
                            });
                        }
                    }
                    Err(e) => {
                        warn!(task_type = %task_type, error = %error_chain(&e), "Task activation failed");
                        activation_failed = true;
                    }
                }
            }

            let delay = if activation_failed {
                self.config.error_backoff()
            } else if activated == 0 {
                self.config.poll_interval()
            } else {
                Duration::ZERO
            };

            if !delay.is_zero() {
                tokio::select! {
                    _ = shutdown.cancelled() => break 'poll,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        info!(in_flight = in_flight.len(), "Task worker stopping, draining in-flight tasks");
        while let Some(joined) = in_flight.join_next().await {
            log_join(joined);
        }
        info!("Task worker stopped");
    }
}

fn log_join(joined: Result<DispatchOutcome, tokio::task::JoinError>) {
    match joined {
        Ok(outcome) => debug!(?outcome, "Task dispatch finished"),
        Err(e) => error!(error = %e, "Task dispatch panicked"),
    }
}
