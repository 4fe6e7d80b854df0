//! Public job catalog and application intake handlers.

use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::{APPLICATIONS_TAG, JOBS_TAG};
use crate::api::dto::{
    ApplicationSuccessResponse, ApplyFormResponse, ErrorResponse, JobDetailResponse,
    JobListResponse, JobSummaryResponse,
};
use crate::api::extract::AppForm;
use crate::error::{AppError, AppResult};
use crate::models::{Applicant, SubmitOutcome};
use crate::state::AppState;

/// Creates the candidate-facing routes under `/jobs`.
pub fn job_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(list_jobs))
        .routes(routes!(get_job))
        .routes(routes!(apply_form, submit_application))
        .routes(routes!(application_success))
}

/// Creates the machine-readable routes under `/api`.
pub fn api_job_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(list_jobs_api))
}

/// GET /jobs - Open postings, newest first
#[utoipa::path(
    get,
    path = "/jobs",
    tag = JOBS_TAG,
    responses(
        (status = 200, description = "Open job postings", body = JobListResponse)
    )
)]
async fn list_jobs(State(state): State<AppState>) -> AppResult<Json<JobListResponse>> {
    let jobs = state.services.catalog.list_open().await?;
    Ok(Json(JobListResponse::from(jobs)))
}

/// GET /jobs/{id} - Posting detail with application count
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    tag = JOBS_TAG,
    params(
        ("id" = String, Path, description = "External job id")
    ),
    responses(
        (status = 200, description = "Job posting found", body = JobDetailResponse),
        (status = 404, description = "Job posting not found", body = ErrorResponse)
    )
)]
async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<JobDetailResponse>> {
    let detail = state.services.catalog.get_detail(&id).await?;
    Ok(Json(JobDetailResponse::from(detail)))
}

/// GET /jobs/{id}/apply - Application form descriptor
#[utoipa::path(
    get,
    path = "/jobs/{id}/apply",
    tag = APPLICATIONS_TAG,
    params(
        ("id" = String, Path, description = "External job id")
    ),
    responses(
        (status = 200, description = "Posting the form applies to", body = ApplyFormResponse),
        (status = 404, description = "Job posting not found", body = ErrorResponse)
    )
)]
async fn apply_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApplyFormResponse>> {
    let posting = state.services.catalog.get_posting(&id).await?;
    Ok(Json(ApplyFormResponse::from(posting)))
}

/// POST /jobs/{id}/apply - Submit an application form
#[utoipa::path(
    post,
    path = "/jobs/{id}/apply",
    tag = APPLICATIONS_TAG,
    params(
        ("id" = String, Path, description = "External job id")
    ),
    request_body(content = Applicant, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Application stored, redirect to the confirmation"),
        (status = 400, description = "Invalid form", body = ErrorResponse),
        (status = 404, description = "Job posting not found", body = ErrorResponse),
        (status = 409, description = "Job posting no longer accepts applications", body = ErrorResponse)
    )
)]
async fn submit_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppForm(applicant): AppForm<Applicant>,
) -> AppResult<Redirect> {
    match state.services.applications.submit(&id, applicant).await? {
        SubmitOutcome::Accepted { .. } => Ok(Redirect::to(&success_location(&id)?)),
        SubmitOutcome::JobNotFound => Err(AppError::not_found("job posting", "job_id", id)),
        SubmitOutcome::PostingClosed { status } => Err(AppError::Conflict {
            message: format!(
                "Job posting '{}' is {} and no longer accepts applications",
                id, status
            ),
        }),
    }
}

/// Path of the confirmation page, with the job id as one encoded segment.
///
/// Ids may contain `/`, `?`, `%` or non-ASCII text; left raw they would
/// split the path or leave the `Location` header with bytes outside ASCII.
fn success_location(job_id: &str) -> AppResult<String> {
    let mut url = reqwest::Url::parse("http://localhost/").map_err(anyhow::Error::from)?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("base URL cannot carry a path"))?
        .clear()
        .extend(["jobs", job_id, "apply", "success"]);
    Ok(url.path().to_string())
}

/// GET /jobs/{id}/apply/success - Submission confirmation
#[utoipa::path(
    get,
    path = "/jobs/{id}/apply/success",
    tag = APPLICATIONS_TAG,
    params(
        ("id" = String, Path, description = "External job id")
    ),
    responses(
        (status = 200, description = "Confirmation", body = ApplicationSuccessResponse),
        (status = 404, description = "Job posting not found", body = ErrorResponse)
    )
)]
async fn application_success(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApplicationSuccessResponse>> {
    let posting = state.services.catalog.get_posting(&id).await?;
    Ok(Json(ApplicationSuccessResponse::from(posting)))
}

/// GET /api/jobs - Open postings for machine consumers
#[utoipa::path(
    get,
    path = "/jobs",
    tag = JOBS_TAG,
    responses(
        (status = 200, description = "Open job postings, created_at as RFC 3339", body = Vec<JobSummaryResponse>)
    )
)]
async fn list_jobs_api(State(state): State<AppState>) -> AppResult<Json<Vec<JobSummaryResponse>>> {
    let jobs = state.services.catalog.list_open().await?;
    Ok(Json(jobs.into_iter().map(JobSummaryResponse::from).collect()))
}
