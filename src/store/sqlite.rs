//! SQLite-backed document store.
//!
//! Every collection shares one table:
//!
//! ```text
//! documents(collection TEXT, id TEXT, body TEXT, PRIMARY KEY(collection, id))
//! ```
//!
//! `body` holds the document fields as a JSON object. Queries load the
//! collection and filter/sort in process, which is fine at catalog scale.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

use super::{Document, DocumentId, DocumentStore, DocumentWrite, Query, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id         TEXT NOT NULL,
    body       TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);
";

/// Document store persisted in a SQLite database file
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("{}: {}", parent.display(), e)))?;
        }

        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    /// Database file path (`None` for in-memory)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run a closure against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("blocking task failed: {}", e)))?
    }
}

fn parse_body(body: &str) -> Result<Map<String, Value>, StoreError> {
    match serde_json::from_str(body)? {
        Value::Object(fields) => Ok(fields),
        other => Ok(Map::from_iter([("value".to_string(), other)])),
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert(&self, collection: &str, write: DocumentWrite) -> Result<DocumentId, StoreError> {
        let collection = collection.to_string();

        self.with_conn(move |conn| {
            let id = DocumentId::generate();
            let mut fields = Map::new();
            write.apply_to(&mut fields);
            let body = serde_json::to_string(&fields)?;

            conn.execute(
                "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
                params![collection, id.as_str(), body],
            )?;

            Ok(id)
        })
        .await
    }

    async fn get(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        let collection = collection.to_string();
        let id = id.clone();

        self.with_conn(move |conn| {
            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;

            match body {
                Some(b) => Ok(Some(Document {
                    id,
                    fields: parse_body(&b)?,
                })),
                None => Ok(None),
            }
        })
        .await
    }

    async fn patch(
        &self,
        collection: &str,
        id: &DocumentId,
        write: DocumentWrite,
    ) -> Result<(), StoreError> {
        let collection = collection.to_string();
        let id = id.clone();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;

            let body: Option<String> = tx
                .query_row(
                    "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(body) = body else {
                return Err(StoreError::not_found(&collection, &id));
            };

            let mut fields = parse_body(&body)?;
            write.apply_to(&mut fields);

            tx.execute(
                "UPDATE documents SET body = ?3 WHERE collection = ?1 AND id = ?2",
                params![collection, id.as_str(), serde_json::to_string(&fields)?],
            )?;
            tx.commit()?;

            Ok(())
        })
        .await
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<(), StoreError> {
        let collection = collection.to_string();
        let id = id.clone();

        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id.as_str()],
            )?;
            Ok(())
        })
        .await
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let collection = collection.to_string();
        let query = query.clone();

        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY rowid",
            )?;

            let rows = stmt.query_map(params![collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut docs = Vec::new();
            for row in rows {
                let (id, body) = row?;
                docs.push(Document {
                    id: DocumentId::from(id),
                    fields: parse_body(&body)?,
                });
            }

            query.apply(&mut docs);
            Ok(docs)
        })
        .await
    }
}
