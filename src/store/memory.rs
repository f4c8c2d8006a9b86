//! In-process stores, used with `STORAGE_BACKEND=memory` and by the tests.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Collection, DocumentStore, Direction, Fields, ObjectStore, OrderBy, StoreError, StoredDocument,
};

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<StoredDocument>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, collection: Collection, id: &str) -> Option<StoredDocument> {
        let guard = self.collections.read().await;
        guard
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn add(&self, collection: Collection, fields: Fields) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let mut guard = self.collections.write().await;
        guard.entry(collection).or_default().push(StoredDocument {
            id: id.clone(),
            fields,
        });
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let mut guard = self.collections.write().await;
        let doc = guard
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })?;
        for (key, value) in fields {
            doc.fields.insert(key, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let mut guard = self.collections.write().await;
        let docs = guard.entry(collection).or_default();
        let before = docs.len();
        docs.retain(|d| d.id != id);
        if docs.len() == before {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn list(
        &self,
        collection: Collection,
        order: Option<OrderBy>,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let guard = self.collections.read().await;
        let docs = guard.get(&collection).cloned().unwrap_or_default();
        let Some(order) = order else {
            return Ok(docs);
        };

        // Ties fall back to insertion position in the same direction, like `seq` in SQL.
        let mut indexed: Vec<(usize, StoredDocument)> = docs.into_iter().enumerate().collect();
        indexed.sort_by(|(ia, a), (ib, b)| {
            let ord = compare_values(a.fields.get(order.field), b.fields.get(order.field))
                .then(ia.cmp(ib));
            match order.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });
        Ok(indexed.into_iter().map(|(_, doc)| doc).collect())
    }
}

// Missing < numbers < strings, mirroring how the SQL store sorts JSON values.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(_) => 3,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

pub struct MemoryObjectStore {
    url_prefix: String,
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new(url_prefix: impl Into<String>) -> Self {
        MemoryObjectStore {
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub async fn contains(&self, locator: &str) -> bool {
        self.objects.read().await.contains_key(locator)
    }

    fn locator_of<'a>(&self, locator_or_url: &'a str) -> &'a str {
        locator_or_url
            .strip_prefix(self.url_prefix.as_str())
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(locator_or_url)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, bytes: &[u8], path: &str) -> Result<String, StoreError> {
        let locator = path.trim_start_matches('/').to_string();
        if locator.is_empty() {
            return Err(StoreError::InvalidLocator(path.to_string()));
        }
        self.objects
            .write()
            .await
            .insert(locator.clone(), bytes.to_vec());
        Ok(locator)
    }

    fn public_url(&self, locator: &str) -> String {
        format!("{}/{}", self.url_prefix, locator)
    }

    async fn delete(&self, locator_or_url: &str) -> Result<(), StoreError> {
        let locator = self.locator_of(locator_or_url);
        match self.objects.write().await.remove(locator) {
            Some(_) => Ok(()),
            None => Err(StoreError::ObjectNotFound(locator.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::to_fields;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        to_fields(&value).unwrap()
    }

    #[tokio::test]
    async fn update_merges_and_keeps_other_fields() {
        let store = MemoryDocumentStore::new();
        let id = store
            .add(Collection::News, fields(json!({ "title": "A", "content": "x" })))
            .await
            .unwrap();
        store
            .update(Collection::News, &id, fields(json!({ "title": "B" })))
            .await
            .unwrap();

        let doc = store.get(Collection::News, &id).await.unwrap();
        assert_eq!(doc.fields["title"], json!("B"));
        assert_eq!(doc.fields["content"], json!("x"));
    }

    #[tokio::test]
    async fn update_and_delete_unknown_ids_fail() {
        let store = MemoryDocumentStore::new();
        let err = store
            .update(Collection::Programs, "missing", Fields::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        let err = store.delete(Collection::Programs, "missing").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_orders_by_field_and_keeps_insertion_order_otherwise() {
        let store = MemoryDocumentStore::new();
        for (name, at) in [("a", 2), ("b", 3), ("c", 1)] {
            store
                .add(Collection::Comments, fields(json!({ "name": name, "createdAt": at })))
                .await
                .unwrap();
        }

        let names = |docs: Vec<StoredDocument>| -> Vec<String> {
            docs.into_iter()
                .map(|d| d.fields["name"].as_str().unwrap().to_string())
                .collect()
        };

        let desc = store
            .list(Collection::Comments, Some(OrderBy::desc("createdAt")))
            .await
            .unwrap();
        assert_eq!(names(desc), ["b", "a", "c"]);

        let plain = store.list(Collection::Comments, None).await.unwrap();
        assert_eq!(names(plain), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn equal_sort_keys_follow_insertion_position() {
        let store = MemoryDocumentStore::new();
        for (name, at) in [("first", 5), ("second", 5), ("older", 1), ("third", 5)] {
            store
                .add(Collection::News, fields(json!({ "title": name, "createdAt": at })))
                .await
                .unwrap();
        }
        let titles = |docs: Vec<StoredDocument>| -> Vec<String> {
            docs.into_iter()
                .map(|d| d.fields["title"].as_str().unwrap().to_string())
                .collect()
        };

        let desc = store
            .list(Collection::News, Some(OrderBy::desc("createdAt")))
            .await
            .unwrap();
        assert_eq!(titles(desc), ["third", "second", "first", "older"]);

        let asc = store
            .list(Collection::News, Some(OrderBy::asc("createdAt")))
            .await
            .unwrap();
        assert_eq!(titles(asc), ["older", "first", "second", "third"]);
    }

    #[tokio::test]
    async fn object_delete_accepts_public_url() {
        let store = MemoryObjectStore::new("http://localhost/uploads/");
        let locator = store.upload(b"img", "news/1_a.png").await.unwrap();
        let url = store.public_url(&locator);
        assert_eq!(url, "http://localhost/uploads/news/1_a.png");

        store.delete(&url).await.unwrap();
        assert!(!store.contains(&locator).await);
        assert!(matches!(
            store.delete(&url).await,
            Err(StoreError::ObjectNotFound(_))
        ));
    }
}
