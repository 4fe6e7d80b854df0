//! Candidate application intake.

use std::sync::Arc;

use tracing::{info, warn};
use validator::Validate;

use crate::error::AppResult;
use crate::models::{Applicant, NewJobApplication, SubmitOutcome};
use crate::repositories::JobApplicationRepository;

/// Service accepting applications against open postings.
#[derive(Clone)]
pub struct ApplicationService {
    applications: Arc<dyn JobApplicationRepository>,
}

impl ApplicationService {
    pub fn new(applications: Arc<dyn JobApplicationRepository>) -> Self {
        Self { applications }
    }

    /// Validate and store an application for `job_id`.
    ///
    /// The applicant is normalized first, so blank optional inputs are
    /// stored as absent.
    ///
    /// # Errors
    /// `ValidationErrors` listing every invalid field, or any repository error.
    /// A missing or closed posting is not an error; it is reported through
    /// [`SubmitOutcome`].
    pub async fn submit(&self, job_id: &str, applicant: Applicant) -> AppResult<SubmitOutcome> {
        let applicant = applicant.normalized();
        applicant.validate()?;

        let outcome = self
            .applications
            .submit(NewJobApplication::new(job_id, applicant))
            .await?;

        match outcome {
            SubmitOutcome::Accepted { application_id } => {
                info!(job_id, application_id, "Application accepted");
            }
            SubmitOutcome::JobNotFound => {
                warn!(job_id, "Application for unknown job posting");
            }
            SubmitOutcome::PostingClosed { status } => {
                warn!(job_id, status = %status, "Application for closed job posting");
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::PostingData;
    use crate::repositories::{JobPostingRepository, MemoryStore};

    fn applicant(email: &str) -> Applicant {
        Applicant {
            full_name: "Grace Hopper".to_string(),
            email: email.to_string(),
            phone: Some(" ".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_accepted_and_normalized() {
        let store = MemoryStore::new();
        store.publish("J-1", &PostingData::default()).await.unwrap();
        let service = ApplicationService::new(Arc::new(store.clone()));

        let outcome = service
            .submit("J-1", applicant("grace@example.com"))
            .await
            .unwrap();

        assert!(matches!(outcome, SubmitOutcome::Accepted { .. }));
        let stored = store.applications_for("J-1").await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].application.phone, None);
    }

    #[tokio::test]
    async fn test_invalid_applicant_is_not_stored() {
        let store = MemoryStore::new();
        store.publish("J-2", &PostingData::default()).await.unwrap();
        let service = ApplicationService::new(Arc::new(store.clone()));

        let result = service.submit("J-2", applicant("nope")).await;

        match result {
            Err(AppError::ValidationErrors { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "email");
            }
            other => panic!("expected validation errors, got {other:?}"),
        }
        assert!(store.applications_for("J-2").await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let store = MemoryStore::new();
        let service = ApplicationService::new(Arc::new(store));

        let outcome = service
            .submit("UNKNOWN", applicant("grace@example.com"))
            .await
            .unwrap();

        assert_eq!(outcome, SubmitOutcome::JobNotFound);
    }
}
