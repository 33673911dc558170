//! Document store abstraction backing the catalog.
//!
//! A store holds named collections of JSON documents keyed by a
//! store-assigned id. It supports insert, get, partial patch, delete and
//! equality queries with an ascending sort on one field.
//!
//! Backends:
//! - `MemoryStore`: process-local maps, used by tests and the `memory` backend
//! - `SqliteStore`: a single SQLite table with JSON bodies

pub mod memory;
pub mod sqlite;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Errors surfaced by a document store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Failures worth a manual retry by the caller
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable(_) => true,
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    fn not_found(collection: &str, id: &DocumentId) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Store-assigned document identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a fresh id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A document as read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Flatten into a JSON object with the id under `"id"`
    pub fn into_value(self) -> Value {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id.0));
        Value::Object(fields)
    }
}

/// A value in a write
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Literal JSON value
    Value(Value),

    /// Resolved by the store to its own clock at write time
    ServerTimestamp,
}

/// A set of field writes applied by insert or patch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentWrite {
    fields: BTreeMap<String, FieldValue>,
}

impl DocumentWrite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to a literal value
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), FieldValue::Value(value.into()));
        self
    }

    /// Set a field to the store's write time
    pub fn server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), FieldValue::ServerTimestamp);
        self
    }

    /// Merge into `target`, resolving server timestamps to now
    pub fn apply_to(&self, target: &mut Map<String, Value>) {
        let now = Value::String(Utc::now().to_rfc3339());

        for (field, value) in &self.fields {
            let value = match value {
                FieldValue::Value(v) => v.clone(),
                FieldValue::ServerTimestamp => now.clone(),
            };
            target.insert(field.clone(), value);
        }
    }
}

/// Equality filters plus an optional ascending sort
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Sort ascending on `field`
    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    /// Whether a document passes every filter and has the sort field
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        let filtered = self
            .filters
            .iter()
            .all(|(field, expected)| fields.get(field) == Some(expected));

        let sortable = match &self.order_by {
            Some(field) => fields.contains_key(field),
            None => true,
        };

        filtered && sortable
    }

    /// Filter and sort a candidate set in place
    pub fn apply(&self, docs: &mut Vec<Document>) {
        docs.retain(|doc| self.matches(&doc.fields));

        if let Some(field) = &self.order_by {
            docs.sort_by(|a, b| compare_values(a.fields.get(field), b.fields.get(field)));
        }
    }
}

/// Order JSON values: null < bool < number < string; other kinds are equal
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => {
                let x = x.as_f64().unwrap_or(0.0);
                let y = y.as_f64().unwrap_or(0.0);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Value::String(x), Value::String(y)) => x.cmp(y),
            _ => rank(a).cmp(&rank(b)),
        },
    }
}

/// Backing document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Insert a new document and return its generated id
    async fn insert(&self, collection: &str, write: DocumentWrite) -> Result<DocumentId, StoreError>;

    /// Fetch a document; `None` if absent
    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError>;

    /// Merge fields into an existing document; `NotFound` if absent
    async fn patch(
        &self,
        collection: &str,
        id: &DocumentId,
        write: DocumentWrite,
    ) -> Result<(), StoreError>;

    /// Remove a document; absent ids are a no-op
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError>;

    /// Run an equality query with optional ascending sort
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, fields: Value) -> Document {
        Document {
            id: DocumentId::from(id),
            fields: fields.as_object().unwrap().clone(),
        }
    }

    #[test]
    fn test_write_resolves_server_timestamp() {
        let write = DocumentWrite::new()
            .set("title", "Intro")
            .server_timestamp("updatedAt");

        let mut fields = Map::new();
        write.apply_to(&mut fields);

        assert_eq!(fields.get("title"), Some(&json!("Intro")));
        let stamp = fields.get("updatedAt").and_then(|v| v.as_str()).unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn test_query_filters_and_sorts() {
        let mut docs = vec![
            doc("a", json!({ "isPublished": true, "displayOrder": 3 })),
            doc("b", json!({ "isPublished": false, "displayOrder": 1 })),
            doc("c", json!({ "isPublished": true, "displayOrder": 1 })),
            doc("d", json!({ "isPublished": true })),
        ];

        Query::new()
            .where_eq("isPublished", true)
            .order_by("displayOrder")
            .apply(&mut docs);

        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn test_document_into_value_carries_id() {
        let value = doc("xyz", json!({ "title": "T" })).into_value();
        assert_eq!(value["id"], json!("xyz"));
        assert_eq!(value["title"], json!("T"));
    }
}
