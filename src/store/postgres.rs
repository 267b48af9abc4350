use crate::store::document::generate_document_id;
use crate::store::trait_def::{now_millis, validate_field};
use crate::store::{Direction, Document, DocumentStore, DocumentWrite, Fields, StoreResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data JSONB NOT NULL,
                updated_at BIGINT NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let row = sqlx::query_scalar::<_, Json<Fields>>(
            r#"
            SELECT data FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|Json(fields)| Document::new(id, fields)))
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
        merge: bool,
    ) -> StoreResult<()> {
        let now = now_millis();
        let mut tx = self.pool.begin().await?;

        // Reserve the row first so concurrent creators queue on its lock
        let reserved = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, updated_at)
            VALUES ($1, $2, '{}'::jsonb, $3)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let Json(current) = sqlx::query_scalar::<_, Json<Fields>>(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
        )
        .bind(collection)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let existing = (reserved.rows_affected() == 0).then_some(current);
        let fields = write.apply(existing.as_ref(), merge, now);

        sqlx::query(
            r#"
            UPDATE documents
            SET data = $3, updated_at = $4
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(&fields))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
    ) -> StoreResult<bool> {
        let now = now_millis();
        let fields = write.apply(None, false, now);

        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(&fields))
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_document(&self, collection: &str, write: DocumentWrite) -> StoreResult<String> {
        let now = now_millis();
        let fields = write.apply(None, false, now);

        loop {
            let id = generate_document_id();
            let result = sqlx::query(
                r#"
                INSERT INTO documents (collection, id, data, updated_at)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (collection, id) DO NOTHING
                "#,
            )
            .bind(collection)
            .bind(&id)
            .bind(Json(&fields))
            .bind(now)
            .execute(self.pool.as_ref())
            .await?;

            if result.rows_affected() > 0 {
                return Ok(id);
            }
        }
    }

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>> {
        validate_field(field)?;

        let rows = sqlx::query_as::<_, (String, Json<Fields>)>(
            r#"
            SELECT id, data FROM documents
            WHERE collection = $1 AND data -> $2 = $3
            "#,
        )
        .bind(collection)
        .bind(field)
        .bind(Json(value))
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(fields))| Document::new(id, fields))
            .collect())
    }

    async fn query_ordered(
        &self,
        collection: &str,
        order_field: &str,
        direction: Direction,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>> {
        validate_field(order_field)?;
        let limit = limit.map(|l| l as i64);

        let sql = format!(
            r#"
            SELECT id, data FROM documents
            WHERE collection = $1 AND data ? $2
            ORDER BY data -> $2 {}, id
            LIMIT $3
            "#,
            direction.as_sql()
        );

        let rows = sqlx::query_as::<_, (String, Json<Fields>)>(&sql)
            .bind(collection)
            .bind(order_field)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(fields))| Document::new(id, fields))
            .collect())
    }
}
