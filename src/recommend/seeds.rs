//! Seed resolution: fetching seed documents and gathering seed pools.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::FieldMap;
use crate::index::{IndexError, IndexGateway};
use crate::models::{Document, SearchRequest};

/// Which field a seed's text was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedField {
    Body,
    Title,
}

/// Text used as the example for a similarity query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedText {
    pub field: SeedField,
    pub text: String,
}

impl SeedText {
    /// Body text if present, else the title, else nothing
    pub fn from_document(doc: &Document) -> Option<Self> {
        if let Some(body) = doc.body() {
            return Some(Self {
                field: SeedField::Body,
                text: body.to_string(),
            });
        }
        doc.title_text().map(|title| Self {
            field: SeedField::Title,
            text: title.to_string(),
        })
    }
}

/// Looks up seed documents through the index gateway
#[derive(Debug, Clone)]
pub struct SeedResolver {
    gateway: Arc<dyn IndexGateway>,
    fields: FieldMap,
}

impl SeedResolver {
    pub fn new(gateway: Arc<dyn IndexGateway>, fields: FieldMap) -> Self {
        Self { gateway, fields }
    }

    /// Fetch a document by identifier
    pub async fn fetch_by_id(&self, id: &str) -> Result<Option<Document>, IndexError> {
        self.fetch_one(&self.fields.id, id).await
    }

    /// Fetch a document by DOI
    pub async fn fetch_by_doi(&self, doi: &str) -> Result<Option<Document>, IndexError> {
        self.fetch_one(&self.fields.doi, doi).await
    }

    /// Resolve the text of a seed: body content, else title, else absent
    pub async fn resolve_content(&self, id: &str) -> Result<Option<String>, IndexError> {
        Ok(self
            .fetch_by_id(id)
            .await?
            .as_ref()
            .and_then(SeedText::from_document)
            .map(|seed| seed.text))
    }

    async fn fetch_one(&self, field: &str, value: &str) -> Result<Option<Document>, IndexError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        let hits = self
            .gateway
            .search(&SearchRequest::term(field, value, 1))
            .await?;
        Ok(hits.into_iter().next())
    }
}

/// Flatten stored collection payloads into a seed pool
///
/// Each payload is a JSON array of identifiers (strings or numbers), either as
/// a JSON value or as JSON text. Malformed payloads and non-scalar entries are
/// skipped. The result keeps first-seen order without duplicates.
pub fn collect_seed_ids(payloads: &[Value]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut seeds = Vec::new();

    for payload in payloads {
        let parsed;
        let items = match payload {
            Value::Array(items) => items,
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Array(items)) => {
                    parsed = items;
                    &parsed
                }
                _ => {
                    tracing::debug!("skipping malformed collection payload");
                    continue;
                }
            },
            _ => continue,
        };

        for item in items {
            let id = match item {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => continue,
            };
            if !id.is_empty() && seen.insert(id.clone()) {
                seeds.push(id);
            }
        }
    }

    seeds
}

/// Errors from a collection store
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("Unknown caller: {0}")]
    UnknownCaller(String),

    #[error("Collection storage error: {0}")]
    Storage(String),
}

/// Maps a caller identity to the payloads of their saved collections
#[async_trait]
pub trait CollectionStore: Send + Sync + std::fmt::Debug {
    async fn collection_payloads(&self, caller: &str) -> Result<Vec<Value>, CollectionError>;
}

/// Collections read from a JSON file of `{ "caller": [payload, ...] }`
#[derive(Debug, Clone)]
pub struct JsonCollectionFile {
    path: PathBuf,
}

impl JsonCollectionFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl CollectionStore for JsonCollectionFile {
    async fn collection_payloads(&self, caller: &str) -> Result<Vec<Value>, CollectionError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| CollectionError::Storage(format!("{}: {}", self.path.display(), e)))?;
        let mut callers: HashMap<String, Vec<Value>> = serde_json::from_str(&content)
            .map_err(|e| CollectionError::Storage(format!("{}: {}", self.path.display(), e)))?;

        callers
            .remove(caller)
            .ok_or_else(|| CollectionError::UnknownCaller(caller.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::InMemoryIndex;
    use crate::models::DocumentBuilder;
    use serde_json::json;

    fn resolver() -> SeedResolver {
        let index = InMemoryIndex::new(vec![
            DocumentBuilder::new("1").title("Has body").content("body text").build(),
            DocumentBuilder::new("2").title("Title only").content("  ").build(),
            DocumentBuilder::new("3").doi("10.1/three").build(),
        ]);
        SeedResolver::new(Arc::new(index), FieldMap::default())
    }

    #[tokio::test]
    async fn test_resolve_content_prefers_body_then_title() {
        let resolver = resolver();
        assert_eq!(resolver.resolve_content("1").await.unwrap().as_deref(), Some("body text"));
        assert_eq!(resolver.resolve_content("2").await.unwrap().as_deref(), Some("Title only"));
        assert_eq!(resolver.resolve_content("3").await.unwrap(), None);
        assert_eq!(resolver.resolve_content("404").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_by_doi() {
        let resolver = resolver();
        let doc = resolver.fetch_by_doi("10.1/three").await.unwrap().unwrap();
        assert_eq!(doc.id, "3");
        assert!(resolver.fetch_by_doi("").await.unwrap().is_none());
    }

    #[test]
    fn test_seed_text_source_field() {
        let doc = DocumentBuilder::new("2").title("Title only").build();
        assert_eq!(SeedText::from_document(&doc).unwrap().field, SeedField::Title);
    }

    #[test]
    fn test_collect_seed_ids_flattens_and_dedups() {
        let payloads = vec![
            json!([3, "1", 2]),
            json!("[\"2\", 4]"),
            json!("not json"),
            json!({"papers": [9]}),
            json!([null, "", 1, 5]),
        ];
        assert_eq!(collect_seed_ids(&payloads), vec!["3", "1", "2", "4", "5"]);
    }

    #[tokio::test]
    async fn test_json_collection_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collections.json");
        std::fs::write(&path, r#"{"alice": [[1, 2], "[3]"], "bob": []}"#).unwrap();

        let store = JsonCollectionFile::new(&path);
        let payloads = store.collection_payloads("alice").await.unwrap();
        assert_eq!(collect_seed_ids(&payloads), vec!["1", "2", "3"]);
        assert!(store.collection_payloads("bob").await.unwrap().is_empty());
        assert!(matches!(
            store.collection_payloads("carol").await,
            Err(CollectionError::UnknownCaller(_))
        ));
    }
}
