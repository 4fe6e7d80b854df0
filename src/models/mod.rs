mod job_application;
mod job_posting;

pub use job_application::{Applicant, JobApplication, NewJobApplication, SubmitOutcome};
pub use job_posting::{
    DocumentShape, JobPosting, JobPostingDetail, JobPostingRow, JobPostingSummary,
    JobPostingSummaryRow, NewJobPostingRow, PostingData, PostingStatus, PublishOutcome,
    StructuredField, StructuredFields,
};
