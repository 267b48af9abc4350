use crate::store::{Direction, Document, DocumentWrite};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store is not available")]
    Unavailable,
    #[error("invalid field path '{0}'")]
    InvalidField(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Other(err.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Other(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Initialize the store (create tables, etc.)
    async fn init(&self) -> Result<()>;

    /// Get a document by id, `None` when it does not exist
    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Write a document. With `merge` only the named fields change and a
    /// missing document is created; without it the document is replaced.
    /// Increments are applied atomically with respect to other writes on the
    /// same document.
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
        merge: bool,
    ) -> StoreResult<()>;

    /// Create `id` from `write` only if it does not exist yet. Returns
    /// whether this call created it; an existing document is left untouched.
    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
    ) -> StoreResult<bool>;

    /// Add a document under a generated id and return the id
    async fn add_document(&self, collection: &str, write: DocumentWrite) -> StoreResult<String>;

    /// Delete a document, returns whether it existed
    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// All documents whose `field` equals `value`
    async fn query_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Document>>;

    /// Documents ordered by `order_field`; `limit` of `None` returns all
    async fn query_ordered(
        &self,
        collection: &str,
        order_field: &str,
        direction: Direction,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>>;
}

/// Field names end up inside JSON paths in SQL, so keep them to a safe charset
pub(crate) fn validate_field(field: &str) -> StoreResult<()> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidField(field.to_string()))
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
