//! Session-scoped schema cache and validation.
//!
//! The schema is fetched once per editing session by logical name and
//! compiled once into a [`jsonschema::Validator`]. Fetch failures leave the
//! cache empty so a later call retries; compile failures poison the session.

use std::sync::Arc;

use jsonschema::{Validator, validator_for};
use schemars::schema_for;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::domain::Document;
use crate::error::EditorError;
use crate::remote::SchemaSource;

/// One engine diagnostic, untouched: instance path plus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub pointer: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issue_at(&self, pointer: &str) -> Option<&ValidationIssue> {
        self.issues.iter().find(|issue| issue.pointer == pointer)
    }
}

/// Compile a raw schema document into a validator.
pub fn compile(schema: &Value) -> Result<Arc<Validator>, EditorError> {
    validator_for(schema)
        .map(Arc::new)
        .map_err(|err| EditorError::SchemaUnavailable(err.to_string()))
}

/// Run a compiled validator and collect its raw diagnostics.
pub fn report_for(validator: &Validator, value: &Value) -> ValidationReport {
    if validator.is_valid(value) {
        return ValidationReport::default();
    }
    let issues = validator
        .iter_errors(value)
        .map(|error| ValidationIssue {
            pointer: error.instance_path.to_string(),
            message: error.to_string(),
        })
        .collect();
    ValidationReport { issues }
}

/// The default schema, generated from the typed document model.
pub fn embedded() -> Value {
    serde_json::to_value(schema_for!(Document)).expect("embedded schema serializes")
}

enum SchemaSlot {
    Empty,
    Ready(Arc<Validator>),
    Poisoned(String),
}

/// Fetch-once/compile-once validator cache for one editing session.
pub struct SchemaStore {
    source: Arc<dyn SchemaSource>,
    name: String,
    slot: Mutex<SchemaSlot>,
}

impl SchemaStore {
    pub fn new(source: Arc<dyn SchemaSource>, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
            slot: Mutex::new(SchemaSlot::Empty),
        }
    }

    /// The compiled validator, fetching and compiling on first use.
    ///
    /// The slot lock is held across the fetch, so concurrent callers share
    /// one in-flight request instead of issuing duplicates.
    pub async fn validator(&self) -> Result<Arc<Validator>, EditorError> {
        let mut slot = self.slot.lock().await;
        match &*slot {
            SchemaSlot::Ready(validator) => Ok(validator.clone()),
            SchemaSlot::Poisoned(message) => {
                Err(EditorError::SchemaUnavailable(message.clone()))
            }
            SchemaSlot::Empty => {
                let raw = self
                    .source
                    .fetch_schema(&self.name)
                    .await
                    .map_err(|err| EditorError::SchemaUnavailable(err.to_string()))?;
                match compile(&raw) {
                    Ok(validator) => {
                        tracing::debug!(schema = %self.name, "schema compiled and cached");
                        *slot = SchemaSlot::Ready(validator.clone());
                        Ok(validator)
                    }
                    Err(err) => {
                        let message = err.to_string();
                        tracing::warn!(schema = %self.name, %message, "schema compile failed");
                        *slot = SchemaSlot::Poisoned(message.clone());
                        Err(EditorError::SchemaUnavailable(message))
                    }
                }
            }
        }
    }

    pub async fn validate_value(&self, value: &Value) -> Result<ValidationReport, EditorError> {
        let validator = self.validator().await?;
        Ok(report_for(&validator, value))
    }

    pub async fn validate_document(
        &self,
        document: &Document,
    ) -> Result<ValidationReport, EditorError> {
        let value = serde_json::to_value(document)
            .map_err(|err| EditorError::Parse(err.to_string()))?;
        self.validate_value(&value).await
    }

    pub async fn is_ready(&self) -> bool {
        matches!(&*self.slot.lock().await, SchemaSlot::Ready(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        fetches: AtomicUsize,
        schema: Value,
        fail_first: AtomicUsize,
    }

    impl CountingSource {
        fn new(schema: Value) -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                schema,
                fail_first: AtomicUsize::new(0),
            }
        }

        fn failing_first(schema: Value, failures: usize) -> Self {
            let source = Self::new(schema);
            source.fail_first.store(failures, Ordering::SeqCst);
            source
        }
    }

    #[async_trait]
    impl SchemaSource for CountingSource {
        async fn fetch_schema(&self, _name: &str) -> anyhow::Result<Value> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self
                .fail_first
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(anyhow!("schema registry unreachable"));
            }
            Ok(self.schema.clone())
        }
    }

    fn title_schema() -> Value {
        json!({
            "type": "object",
            "required": ["title"],
            "properties": {"title": {"type": "string", "minLength": 1}},
        })
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_fetch() {
        let source = Arc::new(CountingSource::new(title_schema()));
        let store = SchemaStore::new(source.clone(), "doc");
        let (a, b) = tokio::join!(store.validator(), store.validator());
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn validator_is_memoized_for_the_session() {
        let source = Arc::new(CountingSource::new(title_schema()));
        let store = SchemaStore::new(source.clone(), "doc");
        store.validator().await.unwrap();
        store.validator().await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_failure_is_retryable() {
        let source = Arc::new(CountingSource::failing_first(title_schema(), 1));
        let store = SchemaStore::new(source.clone(), "doc");
        let first = store.validator().await;
        assert!(matches!(first, Err(EditorError::SchemaUnavailable(_))));
        assert!(store.validator().await.is_ok(), "second attempt refetches");
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn compile_failure_poisons_the_session() {
        let source = Arc::new(CountingSource::new(json!({"type": 42})));
        let store = SchemaStore::new(source.clone(), "doc");
        assert!(store.validator().await.is_err());
        assert!(store.validator().await.is_err());
        assert_eq!(
            source.fetches.load(Ordering::SeqCst),
            1,
            "poisoned slot must not refetch"
        );
    }

    #[tokio::test]
    async fn report_carries_engine_instance_paths() {
        let source = Arc::new(CountingSource::new(title_schema()));
        let store = SchemaStore::new(source, "doc");
        let report = store
            .validate_value(&json!({"title": ""}))
            .await
            .unwrap();
        assert!(!report.is_valid());
        assert!(report.issue_at("/title").is_some());
    }

    #[test]
    fn embedded_schema_compiles() {
        let schema = embedded();
        assert!(compile(&schema).is_ok());
    }
}
