//! Job application models.

use diesel::prelude::*;
use jiff::Timestamp;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::PostingStatus;

/// Candidate details submitted through the application form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate, ToSchema)]
pub struct Applicant {
    #[validate(length(min = 1, max = 255, message = "Full name must be 1-255 characters"))]
    pub full_name: String,

    #[validate(
        email(message = "Email must be a valid address"),
        length(max = 320, message = "Email must be at most 320 characters")
    )]
    pub email: String,

    #[validate(length(max = 64, message = "Phone must be at most 64 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 2048, message = "Profile link must be at most 2048 characters"))]
    pub linkedin_url: Option<String>,

    #[validate(length(max = 10000, message = "Cover letter must be at most 10000 characters"))]
    pub cover_letter: Option<String>,
}

impl Applicant {
    /// Trim every field and turn blank optional fields into `None`.
    ///
    /// HTML forms submit empty inputs as empty strings.
    pub fn normalized(self) -> Self {
        fn optional(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: optional(self.phone),
            linkedin_url: optional(self.linkedin_url),
            cover_letter: optional(self.cover_letter),
        }
    }
}

/// job_applications insert model; `id` and `submitted_at` come from the database.
#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = crate::schema::job_applications)]
pub struct NewJobApplication {
    pub job_id: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub cover_letter: Option<String>,
}

impl NewJobApplication {
    pub fn new(job_id: &str, applicant: Applicant) -> Self {
        Self {
            job_id: job_id.to_string(),
            full_name: applicant.full_name,
            email: applicant.email,
            phone: applicant.phone,
            linkedin_url: applicant.linkedin_url,
            cover_letter: applicant.cover_letter,
        }
    }
}

/// A stored application.
#[derive(Debug, Clone, PartialEq)]
pub struct JobApplication {
    pub id: i64,
    pub application: NewJobApplication,
    pub submitted_at: Timestamp,
}

/// Result of submitting an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted { application_id: i64 },
    JobNotFound,
    /// The posting exists but no longer accepts applications.
    PostingClosed { status: PostingStatus },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn applicant() -> Applicant {
        Applicant {
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_applicant() {
        assert!(applicant().validate().is_ok());
    }

    #[test]
    fn test_missing_name_and_bad_email() {
        let invalid = Applicant {
            full_name: String::new(),
            email: "not-an-email".to_string(),
            ..Default::default()
        };

        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("full_name"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn test_normalized_trims_and_drops_blank_optionals() {
        let raw = Applicant {
            full_name: "  Ada Lovelace ".to_string(),
            email: " ada@example.com".to_string(),
            phone: Some("   ".to_string()),
            linkedin_url: Some(" https://linkedin.com/in/ada ".to_string()),
            cover_letter: Some(String::new()),
        };

        let normalized = raw.normalized();

        assert_eq!(normalized.full_name, "Ada Lovelace");
        assert_eq!(normalized.email, "ada@example.com");
        assert_eq!(normalized.phone, None);
        assert_eq!(
            normalized.linkedin_url.as_deref(),
            Some("https://linkedin.com/in/ada")
        );
        assert_eq!(normalized.cover_letter, None);
    }

    #[test]
    fn test_whitespace_name_is_invalid_after_normalization() {
        let raw = Applicant {
            full_name: "   ".to_string(),
            ..applicant()
        };
        assert!(raw.normalized().validate().is_err());
    }
}
