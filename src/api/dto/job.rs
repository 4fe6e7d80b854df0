//! Job catalog and application DTOs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::{JobPosting, JobPostingDetail, JobPostingSummary, PostingStatus};

/// Catalog entry for an open posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JobSummaryResponse {
    pub job_id: String,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub work_mode: Option<String>,
    pub department: Option<String>,
    /// RFC 3339 timestamp
    #[schema(value_type = String, format = DateTime)]
    pub created_at: String,
}

impl From<JobPostingSummary> for JobSummaryResponse {
    fn from(summary: JobPostingSummary) -> Self {
        Self {
            job_id: summary.job_id,
            job_title: summary.job_title,
            company_name: summary.company_name,
            work_mode: summary.work_mode,
            department: summary.department,
            created_at: summary.created_at.to_string(),
        }
    }
}

/// Open postings with their count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JobListResponse {
    pub jobs: Vec<JobSummaryResponse>,
    pub total: usize,
}

impl From<Vec<JobPostingSummary>> for JobListResponse {
    fn from(summaries: Vec<JobPostingSummary>) -> Self {
        let jobs: Vec<JobSummaryResponse> =
            summaries.into_iter().map(JobSummaryResponse::from).collect();
        Self {
            total: jobs.len(),
            jobs,
        }
    }
}

/// Full posting with its application count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JobDetailResponse {
    pub job_id: String,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub company_id: Option<String>,
    pub department: Option<String>,
    pub number_of_openings: Option<i32>,
    pub work_mode: Option<String>,
    pub job_description: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub locations: Value,
    #[schema(value_type = Object)]
    pub requirements: Value,
    #[schema(value_type = Object)]
    pub employment_details: Value,
    #[schema(value_type = Vec<Object>)]
    pub required_documents: Value,
    #[schema(value_type = Object)]
    pub contact: Value,
    #[schema(value_type = Option<String>, format = Date)]
    pub posting_date: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub closing_date: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub starting_date: Option<String>,
    pub duration: Option<String>,
    pub status: PostingStatus,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: String,
    pub application_count: i64,
}

impl From<JobPostingDetail> for JobDetailResponse {
    fn from(detail: JobPostingDetail) -> Self {
        let posting = detail.posting;
        let structured = &posting.structured;

        Self {
            locations: structured.locations.document(),
            requirements: structured.requirements.document(),
            employment_details: structured.employment_details.document(),
            required_documents: structured.required_documents.document(),
            contact: structured.contact.document(),
            job_id: posting.job_id,
            job_title: posting.job_title,
            company_name: posting.company_name,
            company_id: posting.company_id,
            department: posting.department,
            number_of_openings: posting.number_of_openings,
            work_mode: posting.work_mode,
            job_description: posting.job_description,
            posting_date: posting.posting_date.map(|d| d.to_string()),
            closing_date: posting.closing_date.map(|d| d.to_string()),
            starting_date: posting.starting_date.map(|d| d.to_string()),
            duration: posting.duration,
            status: posting.status,
            created_at: posting.created_at.to_string(),
            application_count: detail.application_count,
        }
    }
}

/// What a candidate needs to fill in the application form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApplyFormResponse {
    pub job_id: String,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub status: PostingStatus,
    pub accepting_applications: bool,
}

impl From<JobPosting> for ApplyFormResponse {
    fn from(posting: JobPosting) -> Self {
        Self {
            accepting_applications: posting.status.accepts_applications(),
            job_id: posting.job_id,
            job_title: posting.job_title,
            company_name: posting.company_name,
            status: posting.status,
        }
    }
}

/// Confirmation shown after a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApplicationSuccessResponse {
    pub job_id: String,
    pub job_title: Option<String>,
    pub message: String,
}

impl From<JobPosting> for ApplicationSuccessResponse {
    fn from(posting: JobPosting) -> Self {
        let message = match &posting.job_title {
            Some(title) => format!("Your application for {} has been received.", title),
            None => "Your application has been received.".to_string(),
        };
        Self {
            job_id: posting.job_id,
            job_title: posting.job_title,
            message,
        }
    }
}
