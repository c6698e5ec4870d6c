//! Canonical document store: the single source of truth for the in-progress
//! document, plus dirty tracking and save-time identity stamping.

use chrono::Utc;
use uuid::Uuid;

use crate::codec;
use crate::domain::{Document, DocumentPatch};

#[derive(Debug, Clone)]
pub struct DocumentStore {
    document: Document,
    dirty: bool,
}

impl DocumentStore {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            dirty: false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The current materialized value, cloned.
    pub fn snapshot(&self) -> Document {
        self.document.clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Merge a partial update and mark dirty.
    pub fn patch(&mut self, patch: DocumentPatch) {
        if patch.is_empty() {
            return;
        }
        patch.apply_to(&mut self.document);
        self.dirty = true;
    }

    /// Swap in a materialized document; dirty only if it actually changed.
    pub fn replace(&mut self, document: Document) -> bool {
        if self.document == document {
            return false;
        }
        self.document = document;
        self.dirty = true;
        true
    }

    /// Replace the document and clear dirty, e.g. after load or save.
    pub fn reset(&mut self, document: Document) {
        self.document = document;
        self.dirty = false;
    }

    /// The outbound copy for create/update: cleaned, with a client-generated
    /// id when none was established and lifecycle stamps attached.
    pub fn prepare_for_save(&self, existing_id: Option<&str>) -> Document {
        let mut document = codec::clean(&self.document);
        if document.id.is_none() {
            document.id = existing_id
                .map(str::to_string)
                .or_else(|| Some(Uuid::new_v4().to_string()));
        }
        let now = Utc::now();
        if existing_id.is_none() && document.created_at.is_none() {
            document.created_at = Some(now);
        }
        document.updated_at = Some(now);
        document
    }
}
