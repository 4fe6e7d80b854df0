//! Job posting models.
//!
//! The posting lifecycle (`PostingStatus`), the tolerant decoding of
//! semi-structured JSON documents (`StructuredField`), and the row types used
//! by the PostgreSQL repository.

use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use jiff::Timestamp;
use jiff::civil::Date;
use jiff_diesel::ToDiesel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::error::AppError;

// ============================================================================
// Status
// ============================================================================

/// Lifecycle status of a job posting.
///
/// Only `RECEIVED -> PUBLISHED` and `PUBLISHED -> CLOSED` are valid
/// transitions. Postings are never deleted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DbEnum, ToSchema,
)]
#[db_enum(
    existing_type_path = "crate::schema::sql_types::PostingStatus",
    value_style = "SCREAMING_SNAKE_CASE"
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostingStatus {
    Received,
    Published,
    Closed,
    Rejected,
}

impl PostingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostingStatus::Received => "RECEIVED",
            PostingStatus::Published => "PUBLISHED",
            PostingStatus::Closed => "CLOSED",
            PostingStatus::Rejected => "REJECTED",
        }
    }

    /// Whether the posting is listed in the public catalog.
    pub fn is_open(self) -> bool {
        matches!(self, PostingStatus::Received | PostingStatus::Published)
    }

    /// Whether candidates may still apply.
    pub fn accepts_applications(self) -> bool {
        self.is_open()
    }

    pub fn can_transition_to(self, next: PostingStatus) -> bool {
        matches!(
            (self, next),
            (PostingStatus::Received, PostingStatus::Published)
                | (PostingStatus::Published, PostingStatus::Closed)
        )
    }

    /// Check a transition, producing a `Conflict` error when it is not allowed.
    pub fn ensure_transition(self, job_id: &str, next: PostingStatus) -> Result<(), AppError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AppError::Conflict {
                message: format!(
                    "Job posting '{}' cannot move from {} to {}",
                    job_id, self, next
                ),
            })
        }
    }
}

impl std::fmt::Display for PostingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an idempotent publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The posting moved from RECEIVED to PUBLISHED in this call.
    Published,
    /// The posting was already PUBLISHED; nothing was modified.
    AlreadyPublished,
    /// The posting is in a status that cannot be published.
    Rejected {
        status: PostingStatus,
        reason: String,
    },
}

impl PublishOutcome {
    /// Decide the outcome of publishing a posting currently in `status`.
    ///
    /// A `Published` outcome obliges the caller to persist the transition
    /// in the same transaction that read `status`.
    pub fn for_current_status(status: PostingStatus) -> Self {
        match status {
            PostingStatus::Received => PublishOutcome::Published,
            PostingStatus::Published => PublishOutcome::AlreadyPublished,
            PostingStatus::Closed | PostingStatus::Rejected => PublishOutcome::Rejected {
                status,
                reason: format!(
                    "posting is {}; only RECEIVED postings can be published",
                    status
                ),
            },
        }
    }

    /// Status of the posting after this outcome.
    pub fn resulting_status(&self) -> PostingStatus {
        match self {
            PublishOutcome::Published | PublishOutcome::AlreadyPublished => {
                PostingStatus::Published
            }
            PublishOutcome::Rejected { status, .. } => *status,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PublishOutcome::Published => "published",
            PublishOutcome::AlreadyPublished => "already_published",
            PublishOutcome::Rejected { .. } => "rejected",
        }
    }
}

// ============================================================================
// Semi-structured documents
// ============================================================================

/// Expected JSON shape of a semi-structured field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentShape {
    /// An ordered sequence, defaulting to `[]`
    Sequence,
    /// A key/value document, defaulting to `{}`
    Object,
}

impl DocumentShape {
    pub fn empty(self) -> Value {
        match self {
            DocumentShape::Sequence => Value::Array(Vec::new()),
            DocumentShape::Object => Value::Object(Map::new()),
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        match self {
            DocumentShape::Sequence => value.is_array(),
            DocumentShape::Object => value.is_object(),
        }
    }
}

/// A semi-structured field decoded once at the persistence boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredField {
    /// A well-formed document of the expected shape
    Present(Value),
    /// Absent or malformed input, replaced by the shape's empty document
    Defaulted(DocumentShape),
}

impl StructuredField {
    /// Decode a raw value. Never fails.
    ///
    /// Strings are parsed as JSON, since legacy producers store documents as
    /// text. Anything that is not of the expected shape becomes the default.
    pub fn decode(raw: Option<&Value>, shape: DocumentShape) -> Self {
        match raw {
            Some(value) if shape.matches(value) => StructuredField::Present(value.clone()),
            Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
                Ok(parsed) if shape.matches(&parsed) => StructuredField::Present(parsed),
                _ => StructuredField::Defaulted(shape),
            },
            _ => StructuredField::Defaulted(shape),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, StructuredField::Present(_))
    }

    /// The effective document: the present value or the shape's default.
    pub fn document(&self) -> Value {
        match self {
            StructuredField::Present(value) => value.clone(),
            StructuredField::Defaulted(shape) => shape.empty(),
        }
    }
}

/// The five semi-structured documents attached to a posting.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredFields {
    pub locations: StructuredField,
    pub requirements: StructuredField,
    pub employment_details: StructuredField,
    pub required_documents: StructuredField,
    pub contact: StructuredField,
}

impl StructuredFields {
    /// Decode each field from the named member of `source`.
    fn decode_from(source: &Map<String, Value>) -> Self {
        let field = |name: &str, shape| StructuredField::decode(source.get(name), shape);
        Self {
            locations: field("locations", DocumentShape::Sequence),
            requirements: field("requirements", DocumentShape::Object),
            employment_details: field("employment_details", DocumentShape::Object),
            required_documents: field("required_documents", DocumentShape::Sequence),
            contact: field("contact", DocumentShape::Object),
        }
    }

    fn decode_columns(
        locations: Value,
        requirements: Value,
        employment_details: Value,
        required_documents: Value,
        contact: Value,
    ) -> Self {
        Self {
            locations: StructuredField::decode(Some(&locations), DocumentShape::Sequence),
            requirements: StructuredField::decode(Some(&requirements), DocumentShape::Object),
            employment_details: StructuredField::decode(
                Some(&employment_details),
                DocumentShape::Object,
            ),
            required_documents: StructuredField::decode(
                Some(&required_documents),
                DocumentShape::Sequence,
            ),
            contact: StructuredField::decode(Some(&contact), DocumentShape::Object),
        }
    }

    /// Names of fields that were replaced by their default.
    pub fn defaulted_fields(&self) -> Vec<&'static str> {
        [
            ("locations", &self.locations),
            ("requirements", &self.requirements),
            ("employment_details", &self.employment_details),
            ("required_documents", &self.required_documents),
            ("contact", &self.contact),
        ]
        .into_iter()
        .filter(|(_, field)| !field.is_present())
        .map(|(name, _)| name)
        .collect()
    }
}

impl Default for StructuredFields {
    fn default() -> Self {
        Self::decode_from(&Map::new())
    }
}

// ============================================================================
// Domain types
// ============================================================================

/// Posting data supplied by the originating process.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostingData {
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub company_id: Option<String>,
    pub department: Option<String>,
    pub number_of_openings: Option<i32>,
    pub work_mode: Option<String>,
    pub job_description: Option<String>,
    pub structured: StructuredFields,
    pub posting_date: Option<Date>,
    pub closing_date: Option<Date>,
    pub starting_date: Option<Date>,
    pub duration: Option<String>,
}

impl PostingData {
    /// Build posting data from a loosely-typed JSON document.
    ///
    /// Tolerant throughout: values of the wrong type are dropped (scalars
    /// become text where that is lossless) and never cause an error.
    pub fn from_document(document: &Value) -> Self {
        let empty = Map::new();
        let source = document.as_object().unwrap_or(&empty);

        let text = |name: &str| source.get(name).and_then(text_value);
        let date = |name: &str| source.get(name).and_then(date_value);

        Self {
            job_title: text("job_title"),
            company_name: text("company_name"),
            company_id: text("company_id"),
            department: text("department"),
            number_of_openings: source.get("number_of_openings").and_then(count_value),
            work_mode: text("work_mode"),
            job_description: text("job_description"),
            structured: StructuredFields::decode_from(source),
            posting_date: date("posting_date"),
            closing_date: date("closing_date"),
            starting_date: date("starting_date"),
            duration: text("duration"),
        }
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn count_value(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts `2026-03-01` or a datetime such as `2026-03-01T09:00:00`.
fn date_value(value: &Value) -> Option<Date> {
    let text = value.as_str()?.trim();
    text.parse::<Date>()
        .ok()
        .or_else(|| text.parse::<jiff::civil::DateTime>().ok().map(|dt| dt.date()))
        .or_else(|| {
            text.parse::<Timestamp>()
                .ok()
                .map(|ts| ts.to_zoned(jiff::tz::TimeZone::UTC).date())
        })
}

/// A job posting as read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPosting {
    pub job_id: String,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub company_id: Option<String>,
    pub department: Option<String>,
    pub number_of_openings: Option<i32>,
    pub work_mode: Option<String>,
    pub job_description: Option<String>,
    pub structured: StructuredFields,
    pub posting_date: Option<Date>,
    pub closing_date: Option<Date>,
    pub starting_date: Option<Date>,
    pub duration: Option<String>,
    pub status: PostingStatus,
    pub created_at: Timestamp,
}

impl JobPosting {
    /// A freshly received posting, before any transition.
    pub fn received(job_id: &str, data: &PostingData, created_at: Timestamp) -> Self {
        Self {
            job_id: job_id.to_string(),
            job_title: data.job_title.clone(),
            company_name: data.company_name.clone(),
            company_id: data.company_id.clone(),
            department: data.department.clone(),
            number_of_openings: data.number_of_openings,
            work_mode: data.work_mode.clone(),
            job_description: data.job_description.clone(),
            structured: data.structured.clone(),
            posting_date: data.posting_date,
            closing_date: data.closing_date,
            starting_date: data.starting_date,
            duration: data.duration.clone(),
            status: PostingStatus::Received,
            created_at,
        }
    }

    pub fn summary(&self) -> JobPostingSummary {
        JobPostingSummary {
            job_id: self.job_id.clone(),
            job_title: self.job_title.clone(),
            company_name: self.company_name.clone(),
            work_mode: self.work_mode.clone(),
            department: self.department.clone(),
            created_at: self.created_at,
        }
    }
}

/// Catalog listing entry.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPostingSummary {
    pub job_id: String,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub work_mode: Option<String>,
    pub department: Option<String>,
    pub created_at: Timestamp,
}

/// Full posting plus the number of applications received.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPostingDetail {
    pub posting: JobPosting,
    pub application_count: i64,
}

// ============================================================================
// Rows (Query/Insert)
// ============================================================================

/// job_profiles query model for SELECT operations
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = crate::schema::job_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobPostingRow {
    pub job_id: String,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub company_id: Option<String>,
    pub department: Option<String>,
    pub number_of_openings: Option<i32>,
    pub work_mode: Option<String>,
    pub job_description: Option<String>,
    pub locations: Value,
    pub requirements: Value,
    pub employment_details: Value,
    pub required_documents: Value,
    pub contact: Value,
    pub posting_date: Option<jiff_diesel::Date>,
    pub closing_date: Option<jiff_diesel::Date>,
    pub starting_date: Option<jiff_diesel::Date>,
    pub duration: Option<String>,
    pub status: PostingStatus,
    pub created_at: jiff_diesel::Timestamp,
}

impl From<JobPostingRow> for JobPosting {
    fn from(row: JobPostingRow) -> Self {
        Self {
            job_id: row.job_id,
            job_title: row.job_title,
            company_name: row.company_name,
            company_id: row.company_id,
            department: row.department,
            number_of_openings: row.number_of_openings,
            work_mode: row.work_mode,
            job_description: row.job_description,
            structured: StructuredFields::decode_columns(
                row.locations,
                row.requirements,
                row.employment_details,
                row.required_documents,
                row.contact,
            ),
            posting_date: row.posting_date.map(|d| d.to_jiff()),
            closing_date: row.closing_date.map(|d| d.to_jiff()),
            starting_date: row.starting_date.map(|d| d.to_jiff()),
            duration: row.duration,
            status: row.status,
            created_at: row.created_at.to_jiff(),
        }
    }
}

/// Catalog listing projection of job_profiles
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = crate::schema::job_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobPostingSummaryRow {
    pub job_id: String,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub work_mode: Option<String>,
    pub department: Option<String>,
    pub created_at: jiff_diesel::Timestamp,
}

impl From<JobPostingSummaryRow> for JobPostingSummary {
    fn from(row: JobPostingSummaryRow) -> Self {
        Self {
            job_id: row.job_id,
            job_title: row.job_title,
            company_name: row.company_name,
            work_mode: row.work_mode,
            department: row.department,
            created_at: row.created_at.to_jiff(),
        }
    }
}

/// job_profiles insert model; `created_at` is assigned by the database.
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::job_profiles)]
pub struct NewJobPostingRow {
    pub job_id: String,
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub company_id: Option<String>,
    pub department: Option<String>,
    pub number_of_openings: Option<i32>,
    pub work_mode: Option<String>,
    pub job_description: Option<String>,
    pub locations: Value,
    pub requirements: Value,
    pub employment_details: Value,
    pub required_documents: Value,
    pub contact: Value,
    pub posting_date: Option<jiff_diesel::Date>,
    pub closing_date: Option<jiff_diesel::Date>,
    pub starting_date: Option<jiff_diesel::Date>,
    pub duration: Option<String>,
    pub status: PostingStatus,
}

impl NewJobPostingRow {
    /// A RECEIVED row storing each structured field's effective document.
    pub fn received(job_id: &str, data: &PostingData) -> Self {
        Self {
            job_id: job_id.to_string(),
            job_title: data.job_title.clone(),
            company_name: data.company_name.clone(),
            company_id: data.company_id.clone(),
            department: data.department.clone(),
            number_of_openings: data.number_of_openings,
            work_mode: data.work_mode.clone(),
            job_description: data.job_description.clone(),
            locations: data.structured.locations.document(),
            requirements: data.structured.requirements.document(),
            employment_details: data.structured.employment_details.document(),
            required_documents: data.structured.required_documents.document(),
            contact: data.structured.contact.document(),
            posting_date: data.posting_date.map(|d| d.to_diesel()),
            closing_date: data.closing_date.map(|d| d.to_diesel()),
            starting_date: data.starting_date.map(|d| d.to_diesel()),
            duration: data.duration.clone(),
            status: PostingStatus::Received,
        }
    }
}
