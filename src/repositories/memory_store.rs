//! In-memory store implementing both repositories.
//!
//! Backs `serve --in-memory` and the HTTP and worker tests. A single
//! async mutex linearizes every operation, which gives the same per-id
//! guarantees the database provides with row locks.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use tokio::sync::Mutex;

use super::{JobApplicationRepository, JobPostingRepository, posting_not_found};
use crate::error::AppResult;
use crate::models::{
    JobApplication, JobPosting, JobPostingSummary, NewJobApplication, PostingData, PostingStatus,
    PublishOutcome, SubmitOutcome,
};

#[derive(Debug, Default)]
struct State {
    postings: HashMap<String, StoredPosting>,
    applications: Vec<JobApplication>,
    next_sequence: u64,
}

#[derive(Debug)]
struct StoredPosting {
    posting: JobPosting,
    /// Insertion order, breaks ties between equal `created_at` values
    sequence: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All applications stored for a posting, oldest first.
    pub async fn applications_for(&self, job_id: &str) -> Vec<JobApplication> {
        let state = self.state.lock().await;
        state
            .applications
            .iter()
            .filter(|a| a.application.job_id == job_id)
            .cloned()
            .collect()
    }

    /// Total number of stored postings in any status.
    pub async fn posting_count(&self) -> usize {
        self.state.lock().await.postings.len()
    }
}

#[async_trait]
impl JobPostingRepository for MemoryStore {
    async fn publish(&self, job_id: &str, data: &PostingData) -> AppResult<PublishOutcome> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let sequence = state.next_sequence;
        let stored = state
            .postings
            .entry(job_id.to_string())
            .or_insert_with(|| StoredPosting {
                posting: JobPosting::received(job_id, data, Timestamp::now()),
                sequence,
            });
        if stored.sequence == sequence {
            state.next_sequence += 1;
        }

        let outcome = PublishOutcome::for_current_status(stored.posting.status);
        if outcome == PublishOutcome::Published {
            stored.posting.status = PostingStatus::Published;
        }
        Ok(outcome)
    }

    async fn transition(&self, job_id: &str, next: PostingStatus) -> AppResult<PostingStatus> {
        let mut state = self.state.lock().await;
        let stored = state
            .postings
            .get_mut(job_id)
            .ok_or_else(|| posting_not_found(job_id))?;

        let current = stored.posting.status;
        current.ensure_transition(job_id, next)?;
        stored.posting.status = next;
        Ok(current)
    }

    async fn list_open(&self) -> AppResult<Vec<JobPostingSummary>> {
        let state = self.state.lock().await;

        let mut open: Vec<&StoredPosting> = state
            .postings
            .values()
            .filter(|s| s.posting.status.is_open())
            .collect();
        open.sort_by_key(|s| Reverse((s.posting.created_at, s.sequence)));

        Ok(open.into_iter().map(|s| s.posting.summary()).collect())
    }

    async fn find(&self, job_id: &str) -> AppResult<Option<JobPosting>> {
        let state = self.state.lock().await;
        Ok(state.postings.get(job_id).map(|s| s.posting.clone()))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl JobApplicationRepository for MemoryStore {
    async fn submit(&self, application: NewJobApplication) -> AppResult<SubmitOutcome> {
        let mut state = self.state.lock().await;

        let Some(stored) = state.postings.get(&application.job_id) else {
            return Ok(SubmitOutcome::JobNotFound);
        };
        let status = stored.posting.status;
        if !status.accepts_applications() {
            return Ok(SubmitOutcome::PostingClosed { status });
        }

        let application_id = state.applications.len() as i64 + 1;
        state.applications.push(JobApplication {
            id: application_id,
            application,
            submitted_at: Timestamp::now(),
        });

        Ok(SubmitOutcome::Accepted { application_id })
    }

    async fn count_for_job(&self, job_id: &str) -> AppResult<i64> {
        let state = self.state.lock().await;
        let count = state
            .applications
            .iter()
            .filter(|a| a.application.job_id == job_id)
            .count();
        Ok(count as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use serde_json::json;

    fn data(title: &str) -> PostingData {
        PostingData::from_document(&json!({ "job_title": title }))
    }

    fn application(job_id: &str) -> NewJobApplication {
        NewJobApplication {
            job_id: job_id.to_string(),
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            linkedin_url: None,
            cover_letter: None,
        }
    }

    #[tokio::test]
    async fn test_publish_is_idempotent() {
        let store = MemoryStore::new();

        let first = store.publish("J-1", &data("Engineer")).await.unwrap();
        let second = store.publish("J-1", &data("Renamed")).await.unwrap();

        assert_eq!(first, PublishOutcome::Published);
        assert_eq!(second, PublishOutcome::AlreadyPublished);
        assert_eq!(store.posting_count().await, 1);

        let posting = store.find("J-1").await.unwrap().unwrap();
        assert_eq!(posting.status, PostingStatus::Published);
        assert_eq!(posting.job_title.as_deref(), Some("Engineer"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_publish_creates_one_row_per_id() {
        let store = MemoryStore::new();
        let mut handles = Vec::new();

        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.publish("SAME", &data("Engineer")).await.unwrap()
            }));
        }
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.publish(&format!("D-{i}"), &data("Other")).await.unwrap()
            }));
        }

        let mut published = 0;
        for handle in handles {
            if handle.await.unwrap() == PublishOutcome::Published {
                published += 1;
            }
        }

        // one for SAME plus one per distinct id
        assert_eq!(published, 1 + 8);
        assert_eq!(store.posting_count().await, 9);
        assert_eq!(store.list_open().await.unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_close_then_publish_is_rejected() {
        let store = MemoryStore::new();
        store.publish("J-2", &data("Engineer")).await.unwrap();

        let previous = store.transition("J-2", PostingStatus::Closed).await.unwrap();
        assert_eq!(previous, PostingStatus::Published);

        let outcome = store.publish("J-2", &data("Engineer")).await.unwrap();
        assert!(matches!(
            outcome,
            PublishOutcome::Rejected {
                status: PostingStatus::Closed,
                ..
            }
        ));
        assert!(store.list_open().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transition_errors() {
        let store = MemoryStore::new();

        let missing = store.transition("nope", PostingStatus::Closed).await;
        assert!(matches!(missing, Err(AppError::NotFound { .. })));

        store.publish("J-3", &data("Engineer")).await.unwrap();
        let invalid = store.transition("J-3", PostingStatus::Received).await;
        assert!(matches!(invalid, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_list_open_newest_first() {
        let store = MemoryStore::new();
        for id in ["A", "B", "C"] {
            store.publish(id, &data(id)).await.unwrap();
        }

        let ids: Vec<String> = store
            .list_open()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.job_id)
            .collect();

        assert_eq!(ids, vec!["C", "B", "A"]);
    }

    #[tokio::test]
    async fn test_submit_outcomes() {
        let store = MemoryStore::new();
        store.publish("J-4", &data("Engineer")).await.unwrap();

        let accepted = store.submit(application("J-4")).await.unwrap();
        assert_eq!(accepted, SubmitOutcome::Accepted { application_id: 1 });

        let missing = store.submit(application("UNKNOWN")).await.unwrap();
        assert_eq!(missing, SubmitOutcome::JobNotFound);
        assert_eq!(store.count_for_job("UNKNOWN").await.unwrap(), 0);

        store.transition("J-4", PostingStatus::Closed).await.unwrap();
        let closed = store.submit(application("J-4")).await.unwrap();
        assert_eq!(
            closed,
            SubmitOutcome::PostingClosed {
                status: PostingStatus::Closed
            }
        );

        assert_eq!(store.count_for_job("J-4").await.unwrap(), 1);
        assert_eq!(store.applications_for("J-4").await.len(), 1);
    }
}
