use crate::store::document::generate_document_id;
use crate::store::trait_def::{now_millis, validate_field};
use crate::store::{Direction, Document, DocumentStore, DocumentWrite, Fields, StoreResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Documents are stored as JSON text in a single `documents` table keyed by
/// (collection, id).
pub struct SqliteStore {
    pool: Arc<SqlitePool>,
    /// Serialises read-modify-write cycles so increments are not lost
    write_lock: Mutex<()>,
}

impl SqliteStore {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
            write_lock: Mutex::new(()),
        })
    }
}

fn decode_row(id: String, data: &str) -> StoreResult<Document> {
    let fields: Fields = serde_json::from_str(data)?;
    Ok(Document::new(id, fields))
}

fn json_path(field: &str) -> StoreResult<String> {
    validate_field(field)?;
    Ok(format!("$.{}", field))
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                updated_at INTEGER NOT NULL,
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
        let row = sqlx::query_scalar::<_, String>(
            r#"
            SELECT data FROM documents
            WHERE collection = ? AND id = ?
            "#,
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(|data| decode_row(id.to_string(), &data)).transpose()
    }

    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
        merge: bool,
    ) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_scalar::<_, String>(
            "SELECT data FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let existing: Option<Fields> = existing
            .map(|data| serde_json::from_str(&data))
            .transpose()?;

        let now = now_millis();
        let fields = write.apply(existing.as_ref(), merge, now);
        let data = serde_json::to_string(&fields)?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (collection, id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(&data)
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
        let data = serde_json::to_string(&write.apply(None, false, now))?;

        let _guard = self.write_lock.lock().await;
        let result = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(&data)
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_document(&self, collection: &str, write: DocumentWrite) -> StoreResult<String> {
        let now = now_millis();
        let data = serde_json::to_string(&write.apply(None, false, now))?;

        loop {
            let id = generate_document_id();
            let result = sqlx::query(
                r#"
                INSERT INTO documents (collection, id, data, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (collection, id) DO NOTHING
                "#,
            )
            .bind(collection)
            .bind(&id)
            .bind(&data)
            .bind(now)
            .execute(self.pool.as_ref())
            .await?;

            if result.rows_affected() > 0 {
                return Ok(id);
            }
        }
    }

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
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
        let path = json_path(field)?;
        let encoded = serde_json::to_string(value)?;

        // json_type keeps "5" and 5 from comparing equal
        let rows = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT id, data FROM documents
            WHERE collection = ?
              AND json_extract(data, ?) = json_extract(?, '$')
              AND json_type(data, ?) = json_type(?, '$')
            "#,
        )
        .bind(collection)
        .bind(&path)
        .bind(&encoded)
        .bind(&path)
        .bind(&encoded)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter()
            .map(|(id, data)| decode_row(id, &data))
            .collect()
    }

    async fn query_ordered(
        &self,
        collection: &str,
        order_field: &str,
        direction: Direction,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>> {
        let path = json_path(order_field)?;
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let sql = format!(
            r#"
            SELECT id, data FROM documents
            WHERE collection = ? AND json_extract(data, ?) IS NOT NULL
            ORDER BY json_extract(data, ?) {}, id
            LIMIT ?
            "#,
            direction.as_sql()
        );

        let rows = sqlx::query_as::<_, (String, String)>(&sql)
            .bind(collection)
            .bind(&path)
            .bind(&path)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        rows.into_iter()
            .map(|(id, data)| decode_row(id, &data))
            .collect()
    }
}
