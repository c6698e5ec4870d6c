//! The dual-view controller: one state machine owning the canonical store,
//! the schema cache, and both edit surfaces for the lifetime of a dialog.

mod guard;
mod text;

pub use guard::SessionToken;
pub use text::TextBuffer;

use std::sync::Arc;
use std::time::Duration;

use crate::codec;
use crate::domain::{Document, DocumentPatch};
use crate::error::EditorError;
use crate::form::FormModel;
use crate::lookup::LookupBinding;
use crate::remote::{LookupService, PersistenceApi, SchemaSource};
use crate::schema::{SchemaStore, ValidationReport};
use crate::store::DocumentStore;

/// Controller states. `Loading` is the `open()` phase; a session is never
/// handed to the caller before both schema and document have resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Loading,
    FormActive,
    TextActive,
    Submitting,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit { id: String },
}

/// The three external collaborators a session talks to.
#[derive(Clone)]
pub struct EditorServices {
    pub schema: Arc<dyn SchemaSource>,
    pub persistence: Arc<dyn PersistenceApi>,
    pub lookup: Arc<dyn LookupService>,
}

#[derive(Debug, Clone)]
pub struct EditorOptions {
    /// Logical schema name requested from the schema source.
    pub schema_name: String,
    pub lookup_debounce: Duration,
    pub lookup_limit: usize,
    /// Ask before discarding unsaved edits on close.
    pub confirm_discard: bool,
    pub pretty_text: bool,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            schema_name: "data-product".to_string(),
            lookup_debounce: Duration::from_millis(250),
            lookup_limit: 20,
            confirm_discard: true,
            pretty_text: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// Unsaved edits exist; call [`EditorSession::close_discarding`] to
    /// confirm, or keep editing.
    ConfirmDiscard,
}

pub struct EditorSession {
    options: EditorOptions,
    persistence: Arc<dyn PersistenceApi>,
    lookup: Arc<dyn LookupService>,
    schema: SchemaStore,
    store: DocumentStore,
    form: FormModel,
    text: Option<TextBuffer>,
    state: EditorState,
    existing_id: Option<String>,
    token: SessionToken,
    transitioning: bool,
    last_report: Option<ValidationReport>,
    schema_error: Option<String>,
}

impl EditorSession {
    /// Open a dialog: create mode starts from an empty draft, edit mode
    /// fetches by id. Schema and document loads race; the form does not
    /// become editable until both have resolved. A failed schema load
    /// degrades the session (validation-gated operations refuse until a
    /// retry succeeds); a failed document fetch is fatal to `open`.
    pub async fn open(
        services: EditorServices,
        options: EditorOptions,
        mode: EditorMode,
    ) -> Result<Self, EditorError> {
        let schema = SchemaStore::new(services.schema.clone(), options.schema_name.clone());
        let document_load = async {
            match &mode {
                EditorMode::Create => Ok(Document::draft()),
                EditorMode::Edit { id } => services
                    .persistence
                    .fetch(id)
                    .await
                    .map_err(|err| EditorError::Persistence(err.to_string())),
            }
        };
        let (schema_outcome, document) = tokio::join!(schema.validator(), document_load);
        let document = document?;
        let schema_error = match schema_outcome {
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(%err, "schema load failed; form editing continues degraded");
                Some(err.to_string())
            }
        };
        let existing_id = match mode {
            EditorMode::Create => None,
            EditorMode::Edit { id } => Some(id),
        };
        tracing::debug!(edit = existing_id.is_some(), "editor session opened");
        Ok(Self {
            form: FormModel::from_document(&document),
            store: DocumentStore::new(document),
            options,
            persistence: services.persistence,
            lookup: services.lookup,
            schema,
            text: None,
            state: EditorState::FormActive,
            existing_id,
            token: SessionToken::new(),
            transitioning: false,
            last_report: None,
            schema_error,
        })
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn is_create(&self) -> bool {
        self.existing_id.is_none()
    }

    pub fn document(&self) -> &Document {
        self.store.document()
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty() || self.text.as_ref().is_some_and(TextBuffer::is_modified)
    }

    /// The most recent validation outcome surfaced to the user.
    pub fn validation_report(&self) -> Option<&ValidationReport> {
        self.last_report.as_ref()
    }

    /// Raw message of the last failed schema load, if the session is
    /// running degraded.
    pub fn schema_error(&self) -> Option<&str> {
        self.schema_error.as_deref()
    }

    /// Read access to the form projection is always available.
    pub fn form(&self) -> &FormModel {
        &self.form
    }

    /// The form is only writable while it is the active edit surface.
    pub fn form_mut(&mut self) -> Result<&mut FormModel, EditorError> {
        self.ensure_open()?;
        if self.state != EditorState::FormActive {
            return Err(EditorError::WrongSurface { expected: "form" });
        }
        Ok(&mut self.form)
    }

    pub fn text(&self) -> Option<&TextBuffer> {
        self.text.as_ref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), EditorError> {
        self.ensure_open()?;
        if self.state != EditorState::TextActive {
            return Err(EditorError::WrongSurface { expected: "text" });
        }
        let Some(buffer) = self.text.as_mut() else {
            return Err(EditorError::WrongSurface { expected: "text" });
        };
        buffer.set_text(text);
        Ok(())
    }

    /// Merge a partial update into the canonical document (form view only).
    pub fn patch(&mut self, patch: DocumentPatch) -> Result<(), EditorError> {
        self.ensure_open()?;
        if self.state != EditorState::FormActive {
            return Err(EditorError::WrongSurface { expected: "form" });
        }
        self.store.patch(patch);
        self.form = FormModel::from_document(self.store.document());
        Ok(())
    }

    /// A lookup binding tied to this session's lifetime.
    pub fn lookup_binding(&self) -> LookupBinding {
        LookupBinding::new(
            self.lookup.clone(),
            self.token.clone(),
            self.options.lookup_debounce,
            self.options.lookup_limit,
        )
    }

    /// Form → Text. Always permitted; validation runs for display only.
    pub async fn switch_to_text(&mut self) -> Result<(), EditorError> {
        self.ensure_open()?;
        if self.state != EditorState::FormActive {
            return Err(EditorError::WrongSurface { expected: "form" });
        }
        self.begin_transition()?;
        let result = self.materialize_text().await;
        self.transitioning = false;
        result
    }

    /// Text → Form. Permitted only when the buffer parses and validates
    /// clean; otherwise the transition is refused and neither the state nor
    /// the store changes.
    pub async fn switch_to_form(&mut self) -> Result<(), EditorError> {
        self.ensure_open()?;
        if self.state != EditorState::TextActive {
            return Err(EditorError::WrongSurface { expected: "text" });
        }
        self.begin_transition()?;
        let result = self.hydrate_form().await;
        self.transitioning = false;
        result
    }

    /// The submit pipeline: materialize → clean → validate → persist.
    ///
    /// Validation failure lands the session in the text view with the full
    /// diagnostics attached. Persistence failure returns to the originating
    /// view with every edit intact; submitting again retries.
    pub async fn submit(&mut self) -> Result<Document, EditorError> {
        self.ensure_open()?;
        let origin = match self.state {
            EditorState::FormActive | EditorState::TextActive => self.state,
            _ => return Err(EditorError::TransitionInFlight),
        };
        self.begin_transition()?;
        self.state = EditorState::Submitting;
        let result = self.run_submit(origin).await;
        self.transitioning = false;
        if result.is_ok() {
            self.finish_close();
        } else if self.state == EditorState::Submitting {
            self.state = origin;
        }
        result
    }

    /// Cancel/close. Confirms first when there are unsaved edits.
    pub fn request_close(&mut self) -> CloseOutcome {
        if self.state == EditorState::Closed {
            return CloseOutcome::Closed;
        }
        if self.options.confirm_discard && self.is_dirty() {
            return CloseOutcome::ConfirmDiscard;
        }
        self.finish_close();
        CloseOutcome::Closed
    }

    pub fn close_discarding(&mut self) {
        if self.state != EditorState::Closed {
            self.finish_close();
        }
    }

    async fn materialize_text(&mut self) -> Result<(), EditorError> {
        self.commit_form();
        let cleaned = codec::clean(self.store.document());
        let value = serde_json::to_value(&cleaned)
            .map_err(|err| EditorError::Parse(err.to_string()))?;
        let text = self.serialize_text(&value)?;
        let report = match self.schema.validate_value(&value).await {
            Ok(report) => {
                self.schema_error = None;
                Some(report)
            }
            Err(EditorError::SchemaUnavailable(message)) => {
                self.schema_error = Some(message);
                None
            }
            Err(err) => return Err(err),
        };
        self.last_report = report.clone();
        self.text = Some(TextBuffer::new(text, report));
        self.state = EditorState::TextActive;
        tracing::debug!("switched to text view");
        Ok(())
    }

    async fn hydrate_form(&mut self) -> Result<(), EditorError> {
        let Some(buffer) = self.text.as_mut() else {
            return Err(EditorError::WrongSurface { expected: "text" });
        };
        let value = buffer.parse()?;
        let report = match self.schema.validate_value(&value).await {
            Ok(report) => report,
            Err(err) => {
                if let EditorError::SchemaUnavailable(message) = &err {
                    self.schema_error = Some(message.clone());
                }
                return Err(err);
            }
        };
        if !report.is_valid() {
            if let Some(buffer) = self.text.as_mut() {
                buffer.set_report(report.clone());
            }
            self.last_report = Some(report.clone());
            tracing::debug!(
                issues = report.issues.len(),
                "text to form transition refused"
            );
            return Err(EditorError::Validation(report));
        }
        let document: Document = serde_json::from_value(value)
            .map_err(|err| EditorError::Parse(err.to_string()))?;
        self.store.replace(codec::clean(&document));
        self.form = FormModel::from_document(self.store.document());
        self.text = None;
        self.last_report = Some(report);
        self.state = EditorState::FormActive;
        tracing::debug!("switched to form view");
        Ok(())
    }

    async fn run_submit(&mut self, origin: EditorState) -> Result<Document, EditorError> {
        let (value, candidate) = match origin {
            EditorState::FormActive => {
                self.commit_form();
                let document = codec::clean(self.store.document());
                let value = serde_json::to_value(&document)
                    .map_err(|err| EditorError::Parse(err.to_string()))?;
                (value, Some(document))
            }
            EditorState::TextActive => {
                let Some(buffer) = self.text.as_mut() else {
                    return Err(EditorError::WrongSurface { expected: "text" });
                };
                match buffer.parse() {
                    Ok(value) => (value, None),
                    Err(err) => {
                        self.state = origin;
                        return Err(err);
                    }
                }
            }
            _ => return Err(EditorError::TransitionInFlight),
        };

        let report = match self.schema.validate_value(&value).await {
            Ok(report) => report,
            Err(err) => {
                if let EditorError::SchemaUnavailable(message) = &err {
                    self.schema_error = Some(message.clone());
                }
                self.state = origin;
                return Err(err);
            }
        };
        if !report.is_valid() {
            self.last_report = Some(report.clone());
            // land in the text view so the exact diagnostics are visible
            if origin == EditorState::FormActive {
                match self.serialize_text(&value) {
                    Ok(text) => self.text = Some(TextBuffer::new(text, Some(report.clone()))),
                    Err(err) => {
                        self.state = origin;
                        return Err(err);
                    }
                }
            } else if let Some(buffer) = self.text.as_mut() {
                buffer.set_report(report.clone());
            }
            self.state = EditorState::TextActive;
            tracing::debug!(issues = report.issues.len(), "submit blocked by validation");
            return Err(EditorError::Validation(report));
        }

        let candidate = match candidate {
            Some(document) => document,
            None => match serde_json::from_value::<Document>(value) {
                Ok(document) => codec::clean(&document),
                Err(err) => {
                    self.state = origin;
                    return Err(EditorError::Parse(err.to_string()));
                }
            },
        };
        self.store.replace(candidate);
        let outbound = self.store.prepare_for_save(self.existing_id.as_deref());
        let saved = if self.existing_id.is_some() {
            self.persistence.update(&outbound).await
        } else {
            self.persistence.create(&outbound).await
        };
        match saved {
            Ok(document) => {
                tracing::debug!(id = ?document.id, "document persisted");
                self.store.reset(document.clone());
                Ok(document)
            }
            Err(err) => {
                tracing::warn!(%err, "persistence failed; submit may be retried");
                self.state = origin;
                Err(EditorError::Persistence(err.to_string()))
            }
        }
    }

    fn commit_form(&mut self) {
        let document = self.form.materialize_into(self.store.document());
        self.store.replace(document);
    }

    fn serialize_text(&self, value: &serde_json::Value) -> Result<String, EditorError> {
        let result = if self.options.pretty_text {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        result.map_err(|err| EditorError::Parse(err.to_string()))
    }

    fn ensure_open(&self) -> Result<(), EditorError> {
        if self.state == EditorState::Closed {
            Err(EditorError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn begin_transition(&mut self) -> Result<(), EditorError> {
        if self.transitioning {
            return Err(EditorError::TransitionInFlight);
        }
        self.transitioning = true;
        Ok(())
    }

    fn finish_close(&mut self) {
        self.state = EditorState::Closed;
        self.token.revoke();
        tracing::debug!("editor session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::{MemoryPersistence, MemorySchemaSource, StaticLookup};

    fn services() -> EditorServices {
        EditorServices {
            schema: Arc::new(MemorySchemaSource::embedded()),
            persistence: Arc::new(MemoryPersistence::new()),
            lookup: Arc::new(StaticLookup::default()),
        }
    }

    async fn create_session() -> EditorSession {
        EditorSession::open(services(), EditorOptions::default(), EditorMode::Create)
            .await
            .expect("open create session")
    }

    #[tokio::test]
    async fn create_mode_opens_in_form_view() {
        let session = create_session().await;
        assert_eq!(session.state(), EditorState::FormActive);
        assert!(session.is_create());
        assert!(!session.is_dirty());
        assert!(session.schema_error().is_none());
    }

    #[tokio::test]
    async fn text_surface_is_not_writable_from_form_view() {
        let mut session = create_session().await;
        let result = session.set_text("{}");
        assert!(matches!(
            result,
            Err(EditorError::WrongSurface { expected: "text" })
        ));
    }

    #[tokio::test]
    async fn form_surface_is_not_writable_from_text_view() {
        let mut session = create_session().await;
        session.switch_to_text().await.unwrap();
        assert!(matches!(
            session.form_mut(),
            Err(EditorError::WrongSurface { expected: "form" })
        ));
    }

    #[tokio::test]
    async fn close_without_edits_needs_no_confirmation() {
        let mut session = create_session().await;
        assert_eq!(session.request_close(), CloseOutcome::Closed);
        assert_eq!(session.state(), EditorState::Closed);
        assert!(matches!(
            session.submit().await,
            Err(EditorError::SessionClosed)
        ));
    }

    #[tokio::test]
    async fn dirty_close_asks_for_confirmation() {
        let mut session = create_session().await;
        session.form_mut().unwrap().info.title = "T".to_string();
        session.switch_to_text().await.unwrap();
        assert_eq!(session.request_close(), CloseOutcome::ConfirmDiscard);
        session.close_discarding();
        assert_eq!(session.state(), EditorState::Closed);
    }
}
