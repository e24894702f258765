use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single field-level rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Collected validation failures. Never empty when wrapped in an error:
/// callers get every violated field in one response instead of iterating
/// error-by-error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violations(pub Vec<FieldViolation>);

impl Violations {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.0.push(FieldViolation::new(field, reason));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    /// Ok when nothing was collected, otherwise a `Validation` error.
    pub fn into_result(self) -> Result<(), WorkflowError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(WorkflowError::Validation(self))
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|v| format!("{}: {}", v.field, v.reason))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// The workflow error taxonomy: a single tagged enum, one variant per
/// failure category, each with the payload the caller needs to react.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("validation failed: {0}")]
    Validation(Violations),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("not authorized: {0}")]
    Authorization(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("rate limit exceeded, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("internal error: {0}")]
    Server(String),
}

/// Discriminant of [`WorkflowError`], convenient for matching and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    RateLimited,
    ExternalService,
    Server,
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Validation(_) => ErrorKind::Validation,
            WorkflowError::Authentication(_) => ErrorKind::Authentication,
            WorkflowError::Authorization(_) => ErrorKind::Authorization,
            WorkflowError::NotFound { .. } => ErrorKind::NotFound,
            WorkflowError::Conflict(_) => ErrorKind::Conflict,
            WorkflowError::RateLimited { .. } => ErrorKind::RateLimited,
            WorkflowError::ExternalService(_) => ErrorKind::ExternalService,
            WorkflowError::Server(_) => ErrorKind::Server,
        }
    }

    /// Whether the caller can recover by correcting input and retrying.
    pub fn is_caller_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation | ErrorKind::Conflict | ErrorKind::RateLimited
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn violations_collect_and_render_all_fields() {
        let mut v = Violations::new();
        v.push("serial_number", "already in use");
        v.push("installation_date", "must be on or after production date");

        assert!(v.contains_field("serial_number"));
        assert!(v.contains_field("installation_date"));
        assert_eq!(
            v.to_string(),
            "serial_number: already in use; installation_date: must be on or after production date"
        );
    }

    #[test]
    fn empty_violations_convert_to_ok() {
        assert!(Violations::new().into_result().is_ok());
    }

    #[test]
    fn non_empty_violations_convert_to_validation_error() {
        let mut v = Violations::new();
        v.push("items", "checklist has no items");
        let err = v.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn error_kinds_match_variants() {
        assert_eq!(
            WorkflowError::Conflict("decided".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            WorkflowError::NotFound {
                entity: "control list",
                id: 7
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            WorkflowError::RateLimited { retry_after_ms: 500 }.kind(),
            ErrorKind::RateLimited
        );
    }

    #[test]
    fn recoverable_classification() {
        assert!(WorkflowError::Validation(Violations::new()).is_caller_recoverable());
        assert!(WorkflowError::RateLimited { retry_after_ms: 10 }.is_caller_recoverable());
        assert!(!WorkflowError::Authorization("out of scope".into()).is_caller_recoverable());
        assert!(!WorkflowError::Server("boom".into()).is_caller_recoverable());
    }

    #[test]
    fn display_includes_retry_hint() {
        let err = WorkflowError::RateLimited { retry_after_ms: 250 };
        assert_eq!(err.to_string(), "rate limit exceeded, retry after 250ms");
    }
}
