use serde_json::Value;

use crate::error::EditorError;
use crate::schema::ValidationReport;

/// The raw-text edit surface. Parse failures are local to the buffer; they
/// never reach the canonical store.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    text: String,
    modified: bool,
    parse_error: Option<String>,
    report: Option<ValidationReport>,
}

impl TextBuffer {
    pub fn new(text: String, report: Option<ValidationReport>) -> Self {
        Self {
            text,
            modified: false,
            parse_error: None,
            report,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.text {
            self.text = text;
            self.modified = true;
            self.parse_error = None;
        }
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    /// Validation results surfaced for this buffer (display or blocking).
    pub fn report(&self) -> Option<&ValidationReport> {
        self.report.as_ref()
    }

    pub(super) fn set_report(&mut self, report: ValidationReport) {
        self.report = Some(report);
    }

    /// Syntax check only; structural problems are the validator's business.
    pub(super) fn parse(&mut self) -> Result<Value, EditorError> {
        match serde_json::from_str(&self.text) {
            Ok(value) => {
                self.parse_error = None;
                Ok(value)
            }
            Err(err) => {
                let message = err.to_string();
                self.parse_error = Some(message.clone());
                Err(EditorError::Parse(message))
            }
        }
    }
}
