use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, MySqlPool};
use uuid::Uuid;

use super::{Collection, DocumentStore, Fields, OrderBy, StoreError, StoredDocument};

/// Document collections on a single MySQL `documents` table with a JSON body.
#[derive(Clone)]
pub struct MySqlDocumentStore {
    pool: MySqlPool,
}

#[derive(FromRow)]
struct DocumentRow {
    id: String,
    data: Json<Fields>,
}

impl MySqlDocumentStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlDocumentStore { pool }
    }

    async fn exists(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT id FROM documents WHERE id = ? AND collection = ?")
                .bind(id)
                .bind(collection.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl DocumentStore for MySqlDocumentStore {
    async fn add(&self, collection: Collection, fields: Fields) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO documents (id, collection, data) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(collection.as_str())
            .bind(Json(Value::Object(fields)))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE documents SET data = JSON_MERGE_PATCH(data, ?) WHERE id = ? AND collection = ?",
        )
        .bind(Json(Value::Object(fields)))
        .bind(id)
        .bind(collection.as_str())
        .execute(&self.pool)
        .await?;

        // MySQL reports 0 affected rows when the merge changed nothing.
        if result.rows_affected() == 0 && !self.exists(collection, id).await? {
            return Err(StoreError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ? AND collection = ?")
            .bind(id)
            .bind(collection.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
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
        let rows = match order {
            Some(order) => {
                let sql = format!(
                    "SELECT id, data FROM documents WHERE collection = ? \
                     ORDER BY JSON_EXTRACT(data, ?) {dir}, seq {dir}",
                    dir = order.direction.sql()
                );
                sqlx::query_as::<_, DocumentRow>(&sql)
                    .bind(collection.as_str())
                    .bind(format!("$.{}", order.field))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as::<_, DocumentRow>(
                    "SELECT id, data FROM documents WHERE collection = ? ORDER BY seq ASC",
                )
                .bind(collection.as_str())
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows
            .into_iter()
            .map(|row| StoredDocument {
                id: row.id,
                fields: row.data.0,
            })
            .collect())
    }
}
