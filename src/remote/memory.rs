//! In-memory collaborators for tests, examples, and offline use.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use serde_json::Value;

use crate::domain::Document;
use crate::lookup::LookupCandidate;

use super::{LookupService, PersistenceApi, SchemaSource};

/// Serves one fixed schema regardless of the requested name.
pub struct MemorySchemaSource {
    schema: Value,
}

impl MemorySchemaSource {
    pub fn new(schema: Value) -> Self {
        Self { schema }
    }

    /// Serves the schema generated from the typed document model.
    pub fn embedded() -> Self {
        Self::new(crate::schema::embedded())
    }
}

#[async_trait]
impl SchemaSource for MemorySchemaSource {
    async fn fetch_schema(&self, _name: &str) -> anyhow::Result<Value> {
        Ok(self.schema.clone())
    }
}

/// Document storage backed by a map.
#[derive(Default)]
pub struct MemoryPersistence {
    documents: Mutex<HashMap<String, Document>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a stored document, e.g. for edit-mode tests.
    pub fn insert(&self, document: Document) -> anyhow::Result<()> {
        let id = document
            .id
            .clone()
            .ok_or_else(|| anyhow!("document has no id"))?;
        self.documents
            .lock()
            .expect("persistence map poisoned")
            .insert(id, document);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Document> {
        self.documents
            .lock()
            .expect("persistence map poisoned")
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.documents
            .lock()
            .expect("persistence map poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PersistenceApi for MemoryPersistence {
    async fn fetch(&self, id: &str) -> anyhow::Result<Document> {
        self.get(id)
            .ok_or_else(|| anyhow!("document {id} not found"))
    }

    async fn create(&self, document: &Document) -> anyhow::Result<Document> {
        let Some(id) = document.id.clone() else {
            bail!("create requires a client-generated id");
        };
        let mut documents = self.documents.lock().expect("persistence map poisoned");
        if documents.contains_key(&id) {
            bail!("document {id} already exists");
        }
        documents.insert(id, document.clone());
        Ok(document.clone())
    }

    async fn update(&self, document: &Document) -> anyhow::Result<Document> {
        let Some(id) = document.id.clone() else {
            bail!("update requires an id");
        };
        let mut documents = self.documents.lock().expect("persistence map poisoned");
        if !documents.contains_key(&id) {
            bail!("document {id} not found");
        }
        documents.insert(id, document.clone());
        Ok(document.clone())
    }
}

/// Case-insensitive substring search over a fixed candidate list.
#[derive(Default)]
pub struct StaticLookup {
    candidates: Vec<LookupCandidate>,
}

impl StaticLookup {
    pub fn new(candidates: Vec<LookupCandidate>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl LookupService for StaticLookup {
    async fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<LookupCandidate>> {
        let needle = query.to_lowercase();
        let matches = self
            .candidates
            .iter()
            .filter(|candidate| {
                needle.is_empty() || candidate.display_name.to_lowercase().contains(&needle)
            })
            .take(limit)
            .cloned()
            .collect();
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str) -> LookupCandidate {
        LookupCandidate {
            id: name.to_lowercase(),
            display_name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn static_lookup_filters_and_caps() {
        let lookup = StaticLookup::new(vec![
            candidate("Customers"),
            candidate("Custom Events"),
            candidate("Orders"),
        ]);
        let hits = lookup.search("cust", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        let capped = lookup.search("", 2).await.unwrap();
        assert_eq!(capped.len(), 2);
    }

    #[tokio::test]
    async fn create_then_fetch_round_trips() {
        let persistence = MemoryPersistence::new();
        let mut doc = Document::draft();
        doc.id = Some("d-1".to_string());
        doc.info.title = "T".to_string();
        persistence.create(&doc).await.unwrap();
        let fetched = persistence.fetch("d-1").await.unwrap();
        assert_eq!(fetched, doc);
    }

    #[tokio::test]
    async fn update_of_missing_document_fails() {
        let persistence = MemoryPersistence::new();
        let mut doc = Document::draft();
        doc.id = Some("ghost".to_string());
        assert!(persistence.update(&doc).await.is_err());
    }
}
