//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DocumentStore` port from the `core` crate. Every document is a row of
//! the `documents` table holding its collection path, its id and a JSONB body.

use async_trait::async_trait;
use course_admin_core::ports::{DocumentStore, PortError, PortResult};
use course_admin_core::store::{new_document_id, CollectionPath, DocumentPath, Fields, StoredDocument};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DocumentStore` port.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Creates a new `PgDocumentStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct DocumentRow {
    id: String,
    fields: Json<Fields>,
}

impl DocumentRow {
    fn to_domain(self) -> StoredDocument {
        StoredDocument {
            id: self.id,
            fields: self.fields.0,
        }
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, path: &DocumentPath) -> PortResult<Option<StoredDocument>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, fields FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(path.collection.as_str())
        .bind(&path.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(row.map(DocumentRow::to_domain))
    }

    async fn list(
        &self,
        collection: &CollectionPath,
        order_by: Option<&str>,
    ) -> PortResult<Vec<StoredDocument>> {
        let query = match order_by {
            // JSONB orders numbers numerically and strings lexically; missing keys sort last.
            Some(field) => sqlx::query_as::<_, DocumentRow>(
                "SELECT id, fields FROM documents WHERE collection = $1 \
                 ORDER BY fields -> $2 ASC NULLS LAST, created_at ASC, id ASC",
            )
            .bind(collection.as_str())
            .bind(field),
            None => sqlx::query_as::<_, DocumentRow>(
                "SELECT id, fields FROM documents WHERE collection = $1 \
                 ORDER BY created_at ASC, id ASC",
            )
            .bind(collection.as_str()),
        };
        let rows = query.fetch_all(&self.pool).await.map_err(unexpected)?;
        Ok(rows.into_iter().map(DocumentRow::to_domain).collect())
    }

    async fn list_where(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &Value,
    ) -> PortResult<Vec<StoredDocument>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, fields FROM documents WHERE collection = $1 AND fields -> $2 = $3 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(collection.as_str())
        .bind(field)
        .bind(Json(value))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(rows.into_iter().map(DocumentRow::to_domain).collect())
    }

    async fn create(&self, collection: &CollectionPath, fields: Fields) -> PortResult<String> {
        let id = new_document_id();
        sqlx::query("INSERT INTO documents (collection, id, fields) VALUES ($1, $2, $3)")
            .bind(collection.as_str())
            .bind(&id)
            .bind(Json(&fields))
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(id)
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO documents (collection, id, fields) VALUES ($1, $2, $3) \
             ON CONFLICT (collection, id) DO UPDATE SET fields = EXCLUDED.fields",
        )
        .bind(path.collection.as_str())
        .bind(&path.id)
        .bind(Json(&fields))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE documents SET fields = fields || $3 WHERE collection = $1 AND id = $2",
        )
        .bind(path.collection.as_str())
        .bind(&path.id)
        .bind(Json(&fields))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Document {path} not found")));
        }
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> PortResult<()> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(path.collection.as_str())
            .bind(&path.id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
