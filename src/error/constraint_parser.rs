use regex::Regex;
use std::sync::OnceLock;

/// Utility for parsing PostgreSQL constraint violation messages.
///
/// PostgreSQL names constraints `{table}_{column}_{suffix}` (`_key`, `_fkey`,
/// `_check`) or `{table}_pkey`. Table and column names contain underscores
/// themselves, so the column is taken from the `Key (column)=(value)` detail
/// and stripped off the constraint name to recover the table.
pub struct ConstraintParser;

/// Compiled regex patterns for constraint parsing, cached for performance
struct RegexPatterns {
    key_value: Regex,
    column_name: Regex,
    table_name: Regex,
    relation_name: Regex,
}

impl RegexPatterns {
    fn new() -> Self {
        // The patterns are literals; a failure here is a programming error.
        Self {
            key_value: Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)").expect("valid key regex"),
            column_name: Regex::new(r#"column "([^"]+)""#).expect("valid column regex"),
            table_name: Regex::new(r#"table "([^"]+)""#).expect("valid table regex"),
            relation_name: Regex::new(r#"relation "([^"]+)""#).expect("valid relation regex"),
        }
    }
}

static REGEX_PATTERNS: OnceLock<RegexPatterns> = OnceLock::new();

const CONSTRAINT_SUFFIXES: &[&str] = &["_pkey", "_fkey", "_key", "_check"];

impl ConstraintParser {
    fn patterns() -> &'static RegexPatterns {
        REGEX_PATTERNS.get_or_init(RegexPatterns::new)
    }

    /// Parses a unique (or primary key) violation into `(entity, field, value)`.
    ///
    /// # Examples
    /// ```
    /// use hireflow::error::ConstraintParser;
    ///
    /// let message = "duplicate key value violates unique constraint \"job_profiles_pkey\"\nDETAIL: Key (job_id)=(J-100) already exists.";
    /// let result = ConstraintParser::parse_unique_violation(message, Some("job_profiles_pkey"));
    /// assert_eq!(result, Some(("job_profiles".to_string(), "job_id".to_string(), "J-100".to_string())));
    /// ```
    pub fn parse_unique_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        let (field, value) = Self::extract_key_value_from_message(message)?;
        let entity = constraint_name
            .and_then(|c| Self::entity_from_constraint(c, &field))
            .or_else(|| Self::extract_table_from_message(message))
            .unwrap_or_else(|| "resource".to_string());
        Some((entity, field, value))
    }

    /// Parses a not-null violation into `(entity, field)`.
    pub fn parse_not_null_violation(
        message: &str,
        _constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        let field = Self::extract_column_from_message(message)?;
        let entity = Self::extract_relation_from_message(message)
            .or_else(|| Self::extract_table_from_message(message))
            .unwrap_or_else(|| "resource".to_string());
        Some((entity, field))
    }

    /// Parses a foreign key violation into `(entity, field, referenced_value)`.
    ///
    /// # Examples
    /// ```
    /// use hireflow::error::ConstraintParser;
    ///
    /// let message = "insert or update on table \"job_applications\" violates foreign key constraint \"job_applications_job_id_fkey\"\nDETAIL: Key (job_id)=(UNKNOWN) is not present in table \"job_profiles\".";
    /// let result = ConstraintParser::parse_foreign_key_violation(message, Some("job_applications_job_id_fkey"));
    /// assert_eq!(result, Some(("job_applications".to_string(), "job_id".to_string(), "UNKNOWN".to_string())));
    /// ```
    pub fn parse_foreign_key_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        let (field, value) = Self::extract_key_value_from_message(message)?;
        let entity = constraint_name
            .and_then(|c| Self::entity_from_constraint(c, &field))
            .or_else(|| Self::extract_table_from_message(message))
            .unwrap_or_else(|| "resource".to_string());
        Some((entity, field, value))
    }

    /// Parses a check violation into `(entity, constraint)`.
    ///
    /// Check constraints carry no column detail, so the constraint name itself
    /// is reported as the field.
    pub fn parse_check_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        let constraint = constraint_name?;
        let entity = Self::extract_relation_from_message(message)
            .unwrap_or_else(|| "resource".to_string());
        Some((entity, constraint.to_string()))
    }

    /// Recovers the table name from a constraint name given the column it covers.
    ///
    /// - `job_profiles_pkey` -> `job_profiles`
    /// - `job_applications_job_id_fkey` + `job_id` -> `job_applications`
    pub fn entity_from_constraint(constraint_name: &str, field: &str) -> Option<String> {
        let base = CONSTRAINT_SUFFIXES
            .iter()
            .find_map(|suffix| constraint_name.strip_suffix(suffix))?;

        let entity = base
            .strip_suffix(field)
            .and_then(|rest| rest.strip_suffix('_'))
            .unwrap_or(base);

        if entity.is_empty() {
            None
        } else {
            Some(entity.to_string())
        }
    }

    pub fn extract_column_from_message(message: &str) -> Option<String> {
        Self::capture(&Self::patterns().column_name, message)
    }

    pub fn extract_table_from_message(message: &str) -> Option<String> {
        Self::capture(&Self::patterns().table_name, message)
    }

    pub fn extract_relation_from_message(message: &str) -> Option<String> {
        Self::capture(&Self::patterns().relation_name, message)
    }

    /// Extracts `(field, value)` from the `Key (field)=(value)` detail line.
    pub fn extract_key_value_from_message(message: &str) -> Option<(String, String)> {
        Self::patterns().key_value.captures(message).and_then(|caps| {
            let field = caps.get(1)?.as_str().to_string();
            let value = caps.get(2)?.as_str().to_string();
            Some((field, value))
        })
    }

    fn capture(pattern: &Regex, message: &str) -> Option<String> {
        pattern
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_from_primary_key() {
        assert_eq!(
            ConstraintParser::entity_from_constraint("job_profiles_pkey", "job_id"),
            Some("job_profiles".to_string())
        );
    }

    #[test]
    fn test_entity_from_foreign_key() {
        assert_eq!(
            ConstraintParser::entity_from_constraint("job_applications_job_id_fkey", "job_id"),
            Some("job_applications".to_string())
        );
    }

    #[test]
    fn test_entity_from_unknown_suffix() {
        assert_eq!(
            ConstraintParser::entity_from_constraint("job_profiles_created_at_idx", "created_at"),
            None
        );
    }

    #[test]
    fn test_parse_unique_violation_without_constraint_name() {
        let message = "duplicate key value violates unique constraint\nDETAIL: Key (email)=(a@b.io) already exists.";
        let result = ConstraintParser::parse_unique_violation(message, None);
        assert_eq!(
            result,
            Some(("resource".to_string(), "email".to_string(), "a@b.io".to_string()))
        );
    }

    #[test]
    fn test_parse_not_null_violation() {
        let message =
            "null value in column \"full_name\" of relation \"job_applications\" violates not-null constraint";
        let result = ConstraintParser::parse_not_null_violation(message, None);
        assert_eq!(
            result,
            Some(("job_applications".to_string(), "full_name".to_string()))
        );
    }

    #[test]
    fn test_parse_check_violation() {
        let message = "new row for relation \"job_profiles\" violates check constraint \"job_profiles_openings_check\"";
        let result =
            ConstraintParser::parse_check_violation(message, Some("job_profiles_openings_check"));
        assert_eq!(
            result,
            Some((
                "job_profiles".to_string(),
                "job_profiles_openings_check".to_string()
            ))
        );
    }

    #[test]
    fn test_unparseable_message() {
        assert_eq!(ConstraintParser::parse_unique_violation("boom", None), None);
        assert_eq!(ConstraintParser::parse_not_null_violation("boom", None), None);
    }
}
