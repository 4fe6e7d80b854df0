use utoipa::OpenApi;

pub const JOBS_TAG: &str = "Jobs";
pub const APPLICATIONS_TAG: &str = "Applications";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hireflow",
        description = "Public job catalog and application intake",
    ),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::error::ValidationFieldError,
            crate::models::PostingStatus,
        )
    ),
    tags(
        (name = JOBS_TAG, description = "Open job postings"),
        (name = APPLICATIONS_TAG, description = "Candidate applications"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
