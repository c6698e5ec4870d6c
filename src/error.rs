use thiserror::Error;

use crate::schema::ValidationReport;

/// Editor failure taxonomy.
///
/// Parse and validation failures are resolved inside the editor: the session
/// stays open with all user edits intact. Schema and persistence failures
/// carry the raw underlying message for display.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("schema unavailable: {0}")]
    SchemaUnavailable(String),

    #[error("document failed validation with {} issue(s)", .0.issues.len())]
    Validation(ValidationReport),

    #[error("text is not valid JSON: {0}")]
    Parse(String),

    #[error("persistence request failed: {0}")]
    Persistence(String),

    #[error("another transition is already in flight")]
    TransitionInFlight,

    #[error("the editor session is closed")]
    SessionClosed,

    #[error("operation requires the {expected} view")]
    WrongSurface { expected: &'static str },
}

impl EditorError {
    /// The report attached to a validation failure, if that is what this is.
    pub fn validation_report(&self) -> Option<&ValidationReport> {
        match self {
            EditorError::Validation(report) => Some(report),
            _ => None,
        }
    }
}
