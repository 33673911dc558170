//! In-process document store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{Document, DocumentId, DocumentStore, DocumentWrite, Query, StoreError};

type Collection = BTreeMap<DocumentId, Map<String, Value>>;

/// Document store backed by in-memory maps. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |c| c.len())
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, collection: &str, write: DocumentWrite) -> Result<DocumentId, StoreError> {
        let id = DocumentId::generate();
        let mut fields = Map::new();
        write.apply_to(&mut fields);

        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);

        Ok(id)
    }

    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;

        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|fields| Document {
                id: id.clone(),
                fields: fields.clone(),
            }))
    }

    async fn patch(
        &self,
        collection: &str,
        id: &DocumentId,
        write: DocumentWrite,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;

        let fields = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        write.apply_to(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        if let Some(c) = self.collections.write().await.get_mut(collection) {
            c.remove(id);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let mut docs: Vec<Document> = {
            let collections = self.collections.read().await;
            match collections.get(collection) {
                Some(c) => c
                    .iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect(),
                None => Vec::new(),
            }
        };

        query.apply(&mut docs);
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = MemoryStore::new();
        let id = store
            .insert("videos", DocumentWrite::new().set("title", "Intro"))
            .await
            .unwrap();

        let doc = store.get("videos", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields.get("title"), Some(&json!("Intro")));
        assert!(store.get("other", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_patch_merges_fields() {
        let store = MemoryStore::new();
        let id = store
            .insert(
                "videos",
                DocumentWrite::new().set("title", "Intro").set("isFeatured", false),
            )
            .await
            .unwrap();

        store
            .patch("videos", &id, DocumentWrite::new().set("isFeatured", true))
            .await
            .unwrap();

        let doc = store.get("videos", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields.get("title"), Some(&json!("Intro")));
        assert_eq!(doc.fields.get("isFeatured"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn test_patch_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .patch("videos", &DocumentId::from("nope"), DocumentWrite::new().set("x", 1))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        let id = store
            .insert("videos", DocumentWrite::new().set("title", "Intro"))
            .await
            .unwrap();

        store.delete("videos", &id).await.unwrap();
        store.delete("videos", &id).await.unwrap();
        assert!(store.is_empty("videos").await);
    }

    #[tokio::test]
    async fn test_query_orders_ascending() {
        let store = MemoryStore::new();
        for order in [3, 1, 2] {
            store
                .insert(
                    "videos",
                    DocumentWrite::new().set("displayOrder", order).set("isPublished", true),
                )
                .await
                .unwrap();
        }

        let docs = store
            .query(
                "videos",
                &Query::new().where_eq("isPublished", true).order_by("displayOrder"),
            )
            .await
            .unwrap();

        let orders: Vec<_> = docs
            .iter()
            .map(|d| d.fields["displayOrder"].as_u64().unwrap())
            .collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }
}
