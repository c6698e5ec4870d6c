//! External collaborator interfaces.
//!
//! Transport is out of scope: the editor talks to a schema registry, a
//! persistence backend, and a lookup service through these traits. Raw error
//! messages from implementations are preserved into [`crate::EditorError`].

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::Document;
use crate::lookup::LookupCandidate;

pub mod memory;

/// Returns a schema document by logical name.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn fetch_schema(&self, name: &str) -> anyhow::Result<Value>;
}

/// Create/update/fetch of documents by id.
#[async_trait]
pub trait PersistenceApi: Send + Sync {
    async fn fetch(&self, id: &str) -> anyhow::Result<Document>;
    async fn create(&self, document: &Document) -> anyhow::Result<Document>;
    async fn update(&self, document: &Document) -> anyhow::Result<Document>;
}

/// Free-text search returning candidate foreign-key values.
///
/// `limit` is a hard cap; there is no pagination.
#[async_trait]
pub trait LookupService: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<LookupCandidate>>;
}
