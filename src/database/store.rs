use rusqlite::{OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use super::connection::{self, DbConn, DbPool};
use super::setup;

pub type DocId = i64;
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("document codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("document {id} not found in {collection}")]
    NotFound { collection: String, id: DocId },

    #[error("document {id} in {collection} is not an object")]
    NotAnObject { collection: String, id: DocId },
}

/// A stored document and the id the store assigned to it
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocId,
    pub body: Value,
}

impl Document {
    pub fn decode<R: Record>(self) -> StoreResult<R> {
        let mut record: R = serde_json::from_value(self.body)?;
        record.set_id(self.id);
        Ok(record)
    }
}

/// A typed document living in one collection
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: &'static str;

    fn id(&self) -> DocId;
    fn set_id(&mut self, id: DocId);
}

/// Key-addressable document store.
///
/// `list` and `query` return documents in insertion order.
pub trait DocumentStore {
    fn create(&self, collection: &str, record: &Value) -> StoreResult<DocId>;
    fn update(&self, collection: &str, id: DocId, changes: &Map<String, Value>) -> StoreResult<()>;
    fn get(&self, collection: &str, id: DocId) -> StoreResult<Option<Value>>;
    fn list(&self, collection: &str) -> StoreResult<Vec<Document>>;
    fn query(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Vec<Document>>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn create(&self, collection: &str, record: &Value) -> StoreResult<DocId> {
        (**self).create(collection, record)
    }

    fn update(&self, collection: &str, id: DocId, changes: &Map<String, Value>) -> StoreResult<()> {
        (**self).update(collection, id, changes)
    }

    fn get(&self, collection: &str, id: DocId) -> StoreResult<Option<Value>> {
        (**self).get(collection, id)
    }

    fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        (**self).list(collection)
    }

    fn query(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Vec<Document>> {
        (**self).query(collection, field, value)
    }
}

/// SQLite-backed store keeping every collection in one `documents` table
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn open(database_path: &str) -> StoreResult<Self> {
        Self::with_pool(connection::create_pool(database_path)?)
    }

    pub fn in_memory() -> StoreResult<Self> {
        Self::with_pool(connection::create_memory_pool()?)
    }

    fn with_pool(pool: DbPool) -> StoreResult<Self> {
        let store = Self { pool };
        setup::apply_schema(&mut store.connection()?)?;
        Ok(store)
    }

    fn connection(&self) -> StoreResult<DbConn> {
        connection::get_connection(&self.pool)
    }
}

impl DocumentStore for SqliteStore {
    fn create(&self, collection: &str, record: &Value) -> StoreResult<DocId> {
        let sql = "INSERT INTO documents (collection, body) VALUES (?1, ?2) RETURNING id";
        let body = serde_json::to_string(record)?;
        let conn = self.connection()?;
        let id = conn.query_row(sql, params![collection, body], |row| row.get(0))?;
        Ok(id)
    }

    fn update(&self, collection: &str, id: DocId, changes: &Map<String, Value>) -> StoreResult<()> {
        let mut body = self.get(collection, id)?.ok_or_else(|| StoreError::NotFound {
            collection: collection.to_string(),
            id,
        })?;
        let fields = body.as_object_mut().ok_or_else(|| StoreError::NotAnObject {
            collection: collection.to_string(),
            id,
        })?;
        for (key, value) in changes {
            fields.insert(key.clone(), value.clone());
        }

        let sql = "UPDATE documents SET body = ?1 WHERE collection = ?2 AND id = ?3";
        let conn = self.connection()?;
        conn.execute(sql, params![serde_json::to_string(&body)?, collection, id])?;
        Ok(())
    }

    fn get(&self, collection: &str, id: DocId) -> StoreResult<Option<Value>> {
        let sql = "SELECT body FROM documents WHERE collection = ?1 AND id = ?2";
        let conn = self.connection()?;
        let body: Option<String> = conn
            .query_row(sql, params![collection, id], |row| row.get(0))
            .optional()?;
        body.map(|b| serde_json::from_str(&b)).transpose().map_err(StoreError::from)
    }

    fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let sql = "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY id";
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![collection], parse_document_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(into_document).collect()
    }

    fn query(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Vec<Document>> {
        let sql = "SELECT id, body FROM documents WHERE collection = ?1 AND json_extract(body, ?2) = json_extract(?3, '$') ORDER BY id";
        let path = format!("$.{}", field);
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(
                params![collection, path, serde_json::to_string(value)?],
                parse_document_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(into_document).collect()
    }
}

fn parse_document_row(row: &rusqlite::Row) -> rusqlite::Result<(DocId, String)> {
    Ok((row.get(0)?, row.get(1)?))
}

fn into_document((id, body): (DocId, String)) -> StoreResult<Document> {
    Ok(Document {
        id,
        body: serde_json::from_str(&body)?,
    })
}

/// Typed helpers shared by the collection modules
pub fn insert_record<S: DocumentStore, R: Record>(store: &S, record: &mut R) -> StoreResult<DocId> {
    let body = serde_json::to_value(&*record)?;
    let id = store.create(R::COLLECTION, &body)?;
    record.set_id(id);
    Ok(id)
}

pub fn find_record<S: DocumentStore, R: Record>(store: &S, id: DocId) -> StoreResult<Option<R>> {
    store
        .get(R::COLLECTION, id)?
        .map(|body| Document { id, body }.decode())
        .transpose()
}

pub fn list_records<S: DocumentStore, R: Record>(store: &S) -> StoreResult<Vec<R>> {
    store.list(R::COLLECTION)?.into_iter().map(Document::decode).collect()
}

pub fn query_records<S: DocumentStore, R: Record>(store: &S, field: &str, value: Value) -> StoreResult<Vec<R>> {
    store
        .query(R::COLLECTION, field, &value)?
        .into_iter()
        .map(Document::decode)
        .collect()
}

/// Build a field-change map from `(name, value)` pairs
pub fn changes<const N: usize>(fields: [(&str, Value); N]) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
