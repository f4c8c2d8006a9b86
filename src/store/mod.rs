//! Boundaries to the remote document store and object store.
//!
//! Documents are flat JSON objects grouped in four collections. The typed
//! data access layer (`crate::data`) is the only caller; controllers never
//! touch these traits directly.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

pub mod local;
pub mod memory;
pub mod mysql;

pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    News,
    Programs,
    Gallery,
    Comments,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::News,
        Collection::Programs,
        Collection::Gallery,
        Collection::Comments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::News => "news",
            Collection::Programs => "programs",
            Collection::Gallery => "gallery",
            Collection::Comments => "comments",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Collection::News => 0,
            Collection::Programs => 1,
            Collection::Gallery => 2,
            Collection::Comments => 3,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: &'static str,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(field: &'static str) -> Self {
        OrderBy {
            field,
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: &'static str) -> Self {
        OrderBy {
            field,
            direction: Direction::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Fields,
}

impl StoredDocument {
    /// Deserialize the document into an entity, exposing the store id as `id`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, StoreError> {
        let mut fields = self.fields;
        fields.insert("id".to_string(), Value::String(self.id));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document {collection}/{id} not found")]
    NotFound { collection: Collection, id: String },

    #[error("object {0} not found")]
    ObjectNotFound(String),

    #[error("invalid object locator: {0}")]
    InvalidLocator(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Collection-scoped document storage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return its store-assigned id.
    async fn add(&self, collection: Collection, fields: Fields) -> Result<String, StoreError>;

    /// Shallow-merge `fields` into an existing document.
    async fn update(&self, collection: Collection, id: &str, fields: Fields)
    -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;

    /// All documents of a collection. Without an order, insertion order.
    async fn list(
        &self,
        collection: Collection,
        order: Option<OrderBy>,
    ) -> Result<Vec<StoredDocument>, StoreError>;
}

/// Blob storage for uploaded images.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `path` and return the locator of the new object.
    async fn upload(&self, bytes: &[u8], path: &str) -> Result<String, StoreError>;

    fn public_url(&self, locator: &str) -> String;

    /// Accepts either a locator or a URL previously returned by `public_url`.
    async fn delete(&self, locator_or_url: &str) -> Result<(), StoreError>;
}

pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Malformed(<serde_json::Error as serde::ser::Error>::custom(
            format!("expected an object, got {}", other),
        ))),
    }
}

/// Timestamps are stored as epoch milliseconds so they order numerically.
pub fn stamp(fields: &mut Fields, key: &str, at: DateTime<Utc>) {
    fields.insert(key.to_string(), Value::from(at.timestamp_millis()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Row {
        id: String,
        title: String,
    }

    #[test]
    fn decode_exposes_store_id() {
        let doc = StoredDocument {
            id: "abc".into(),
            fields: to_fields(&json!({ "title": "Halo" })).unwrap(),
        };
        let row: Row = doc.decode().unwrap();
        assert_eq!(row.id, "abc");
        assert_eq!(row.title, "Halo");
    }

    #[test]
    fn to_fields_rejects_non_objects() {
        assert!(matches!(to_fields(&"text"), Err(StoreError::Malformed(_))));
    }

    #[test]
    fn stamp_writes_millis() {
        let mut fields = Fields::new();
        let at = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        stamp(&mut fields, "createdAt", at);
        assert_eq!(fields["createdAt"], json!(1_700_000_000_123i64));
    }
}
