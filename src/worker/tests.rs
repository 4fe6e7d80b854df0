use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::*;
use crate::config::WorkerConfig;
use crate::models::PostingStatus;
use crate::repositories::{JobPostingRepository, MemoryStore, Repositories};
use crate::services::Services;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Complete { key: String, variables: Value },
    Fail { key: String, failure: TaskFailure },
    Incident { key: String, message: String },
}

/// Engine double that hands out queued batches and records reports.
#[derive(Default)]
struct FakeEngine {
    batches: Mutex<VecDeque<Vec<ActivatedTask>>>,
    calls: Mutex<Vec<Call>>,
    unknown_keys: Mutex<HashSet<String>>,
}

impl FakeEngine {
    fn with_batch(tasks: Vec<ActivatedTask>) -> Self {
        let engine = Self::default();
        engine.batches.lock().unwrap().push_back(tasks);
        engine
    }

    fn forget(&self, key: &str) {
        self.unknown_keys.lock().unwrap().insert(key.to_string());
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, key: &str, call: Call) -> Result<(), EngineError> {
        if self.unknown_keys.lock().unwrap().contains(key) {
            return Err(EngineError::NotFound {
                key: key.to_string(),
            });
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl EngineClient for FakeEngine {
    async fn activate(
        &self,
        request: &ActivationRequest,
    ) -> Result<Vec<ActivatedTask>, EngineError> {
        let mut batches = self.batches.lock().unwrap();
        let Some(batch) = batches.pop_front() else {
            return Ok(Vec::new());
        };
        assert!(batch.len() <= request.max_tasks as usize);
        Ok(batch)
    }

    async fn complete(&self, key: &str, variables: Value) -> Result<(), EngineError> {
        self.record(
            key,
            Call::Complete {
                key: key.to_string(),
                variables,
            },
        )
    }

    async fn fail(&self, key: &str, failure: TaskFailure) -> Result<(), EngineError> {
        self.record(
            key,
            Call::Fail {
                key: key.to_string(),
                failure,
            },
        )
    }

    async fn raise_incident(&self, key: &str, message: &str) -> Result<(), EngineError> {
        self.record(
            key,
            Call::Incident {
                key: key.to_string(),
                message: message.to_string(),
            },
        )
    }
}

/// Handler that always fails with a transient error.
struct FlakyHandler;

#[async_trait]
impl TaskHandler for FlakyHandler {
    async fn handle(&self, _task: &ActivatedTask) -> Result<TaskOutput, TaskError> {
        Err(TaskError::transient("database unavailable"))
    }
}

/// Handler that never finishes within a short lease.
struct SlowHandler;

#[async_trait]
impl TaskHandler for SlowHandler {
    async fn handle(&self, _task: &ActivatedTask) -> Result<TaskOutput, TaskError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(TaskOutput::empty())
    }
}

fn task(key: &str, task_type: &str, variables: Value) -> ActivatedTask {
    task_with_lease(key, task_type, variables, SignedDuration::from_secs(60))
}

fn task_with_lease(
    key: &str,
    task_type: &str,
    variables: Value,
    lease: SignedDuration,
) -> ActivatedTask {
    ActivatedTask {
        key: key.to_string(),
        task_type: task_type.to_string(),
        process_instance_key: None,
        retries: 3,
        deadline: Timestamp::now().checked_add(lease).unwrap(),
        variables,
    }
}

fn publish_task(key: &str, job_id: &str) -> ActivatedTask {
    task(
        key,
        PUBLISH_JOB_POSTING_TASK,
        json!({
            "hiringRequest": {
                "job_id": job_id,
                "job_title": "Data Engineer",
                "company_name": "Acme",
                "locations": ["Remote"],
            }
        }),
    )
}

fn test_config() -> WorkerConfig {
    WorkerConfig {
        enabled: true,
        poll_interval_ms: 10,
        error_backoff_ms: 10,
        retry_backoff_base_ms: 100,
        retry_backoff_max_ms: 1_000,
        max_retries: 3,
        ..Default::default()
    }
}

fn dispatcher(engine: Arc<FakeEngine>, registry: HandlerRegistry) -> Dispatcher {
    let config = test_config();
    Dispatcher::new(
        engine,
        Arc::new(registry),
        RetryPolicy::from_config(&config),
        config.max_retries,
    )
}

fn default_registry(store: &MemoryStore) -> HandlerRegistry {
    let services = Services::new(Repositories::in_memory(store.clone()));
    HandlerRegistry::with_defaults(&services)
}

#[tokio::test]
async fn test_publish_completes_with_output_variables() {
    let store = MemoryStore::new();
    let engine = Arc::new(FakeEngine::default());
    let dispatcher = dispatcher(engine.clone(), default_registry(&store));

    let first = dispatcher.dispatch(publish_task("1", "J-100")).await;
    let second = dispatcher.dispatch(publish_task("2", "J-100")).await;

    assert_eq!(first, DispatchOutcome::Completed);
    assert_eq!(second, DispatchOutcome::Completed);
    assert_eq!(
        engine.calls(),
        vec![
            Call::Complete {
                key: "1".to_string(),
                variables: json!({"jobPostingStatus": "PUBLISHED", "alreadyPublished": false}),
            },
            Call::Complete {
                key: "2".to_string(),
                variables: json!({"jobPostingStatus": "PUBLISHED", "alreadyPublished": true}),
            },
        ]
    );

    let posting = store.find("J-100").await.unwrap().unwrap();
    assert_eq!(posting.status, PostingStatus::Published);
    assert_eq!(posting.company_name.as_deref(), Some("Acme"));
}

#[tokio::test]
async fn test_root_variables_are_used_without_hiring_request() {
    let store = MemoryStore::new();
    let engine = Arc::new(FakeEngine::default());
    let dispatcher = dispatcher(engine.clone(), default_registry(&store));

    let outcome = dispatcher
        .dispatch(task(
            "1",
            PUBLISH_JOB_POSTING_TASK,
            json!({"job_id": "J-ROOT", "job_title": "Nurse"}),
        ))
        .await;

    assert_eq!(outcome, DispatchOutcome::Completed);
    assert!(store.find("J-ROOT").await.unwrap().is_some());
}

#[tokio::test]
async fn test_missing_job_id_raises_incident() {
    let store = MemoryStore::new();
    let engine = Arc::new(FakeEngine::default());
    let dispatcher = dispatcher(engine.clone(), default_registry(&store));

    let outcome = dispatcher
        .dispatch(task(
            "7",
            PUBLISH_JOB_POSTING_TASK,
            json!({"hiringRequest": {"job_title": "No id"}}),
        ))
        .await;

    assert!(matches!(outcome, DispatchOutcome::IncidentRaised { .. }));
    assert!(matches!(
        engine.calls().as_slice(),
        [Call::Incident { key, .. }] if key == "7"
    ));
    assert_eq!(store.posting_count().await, 0);
}

#[tokio::test]
async fn test_closed_posting_raises_incident() {
    let store = MemoryStore::new();
    let engine = Arc::new(FakeEngine::default());
    let dispatcher = dispatcher(engine.clone(), default_registry(&store));

    dispatcher.dispatch(publish_task("1", "J-9")).await;
    store
        .transition("J-9", PostingStatus::Closed)
        .await
        .unwrap();

    let outcome = dispatcher.dispatch(publish_task("2", "J-9")).await;

    match outcome {
        DispatchOutcome::IncidentRaised { message } => assert!(message.contains("CLOSED")),
        other => panic!("expected incident, got {other:?}"),
    }
    assert_eq!(
        store.find("J-9").await.unwrap().unwrap().status,
        PostingStatus::Closed
    );
}

#[tokio::test]
async fn test_unknown_task_type_raises_incident() {
    let engine = Arc::new(FakeEngine::default());
    let dispatcher = dispatcher(engine.clone(), HandlerRegistry::new());

    let outcome = dispatcher
        .dispatch(task("3", "send_offer_letter", json!({})))
        .await;

    assert!(matches!(outcome, DispatchOutcome::IncidentRaised { .. }));
    assert_eq!(engine.calls().len(), 1);
}

#[tokio::test]
async fn test_transient_failure_is_retried_then_escalated() {
    let engine = Arc::new(FakeEngine::default());
    let mut registry = HandlerRegistry::new();
    registry.register("flaky", Arc::new(FlakyHandler));
    let dispatcher = dispatcher(engine.clone(), registry);

    let outcome = dispatcher.dispatch(task("4", "flaky", json!({}))).await;
    match outcome {
        DispatchOutcome::Failed { retries, backoff } => {
            assert_eq!(retries, 2);
            assert!(backoff >= Duration::from_millis(50));
            assert!(backoff <= Duration::from_millis(100));
        }
        other => panic!("expected failure report, got {other:?}"),
    }

    let mut last_attempt = task("5", "flaky", json!({}));
    last_attempt.retries = 1;
    let outcome = dispatcher.dispatch(last_attempt).await;
    assert!(matches!(outcome, DispatchOutcome::IncidentRaised { .. }));

    let calls = engine.calls();
    assert!(matches!(
        &calls[0],
        Call::Fail { failure, .. } if failure.retries == 2 && failure.error_message == "database unavailable"
    ));
    assert!(matches!(
        &calls[1],
        Call::Incident { message, .. } if message.contains("Retries exhausted")
    ));
}

#[tokio::test]
async fn test_expired_lease_is_skipped() {
    let store = MemoryStore::new();
    let engine = Arc::new(FakeEngine::default());
    let dispatcher = dispatcher(engine.clone(), default_registry(&store));

    let expired = task_with_lease(
        "6",
        PUBLISH_JOB_POSTING_TASK,
        json!({"job_id": "J-LATE"}),
        SignedDuration::from_secs(-1),
    );

    assert_eq!(
        dispatcher.dispatch(expired).await,
        DispatchOutcome::LeaseExpired
    );
    assert!(engine.calls().is_empty());
    assert_eq!(store.posting_count().await, 0);
}

#[tokio::test]
async fn test_handler_outliving_lease_reports_nothing() {
    let engine = Arc::new(FakeEngine::default());
    let mut registry = HandlerRegistry::new();
    registry.register("slow", Arc::new(SlowHandler));
    let dispatcher = dispatcher(engine.clone(), registry);

    let short = task_with_lease("8", "slow", json!({}), SignedDuration::from_millis(50));

    assert_eq!(
        dispatcher.dispatch(short).await,
        DispatchOutcome::HandlerTimedOut
    );
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_lost_lease_on_report() {
    let store = MemoryStore::new();
    let engine = Arc::new(FakeEngine::default());
    engine.forget("9");
    let dispatcher = dispatcher(engine.clone(), default_registry(&store));

    let outcome = dispatcher.dispatch(publish_task("9", "J-LOST")).await;

    assert_eq!(outcome, DispatchOutcome::LeaseLost);
    // the publish itself committed; redelivery will see AlreadyPublished
    assert!(store.find("J-LOST").await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_run_processes_batch_and_drains_on_shutdown() {
    let store = MemoryStore::new();
    let batch = vec![
        publish_task("1", "J-1"),
        publish_task("2", "J-1"),
        publish_task("3", "J-1"),
        publish_task("4", "J-2"),
        publish_task("5", "J-3"),
    ];
    let engine = Arc::new(FakeEngine::with_batch(batch));
    let worker = TaskWorker::new(engine.clone(), default_registry(&store), test_config());

    let shutdown = CancellationToken::new();
    let running = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { worker.run(shutdown).await }
    });

    tokio::time::timeout(Duration::from_secs(5), async {
        while engine.calls().len() < 5 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .unwrap()
        .unwrap();

    let calls = engine.calls();
    let already: usize = calls
        .iter()
        .filter(|call| {
            matches!(call, Call::Complete { variables, .. } if variables["alreadyPublished"] == true)
        })
        .count();

    assert!(calls.iter().all(|call| matches!(call, Call::Complete { .. })));
    assert_eq!(already, 2);
    assert_eq!(store.posting_count().await, 3);
}

#[tokio::test]
async fn test_run_returns_promptly_when_cancelled() {
    let engine = Arc::new(FakeEngine::default());
    let worker = TaskWorker::new(engine, HandlerRegistry::new(), test_config());

    let shutdown = CancellationToken::new();
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(1), worker.run(shutdown))
        .await
        .unwrap();
}
