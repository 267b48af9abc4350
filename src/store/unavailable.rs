use crate::store::{Direction, Document, DocumentStore, DocumentWrite, StoreError, StoreResult};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Stand-in used when the configured backend could not be reached at startup.
/// Every operation fails with [`StoreError::Unavailable`] so the services
/// answer with their failure results instead of the process exiting.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

#[async_trait]
impl DocumentStore for UnavailableStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn get_document(&self, _collection: &str, _id: &str) -> StoreResult<Option<Document>> {
        Err(StoreError::Unavailable)
    }

    async fn set_document(
        &self,
        _collection: &str,
        _id: &str,
        _write: DocumentWrite,
        _merge: bool,
    ) -> StoreResult<()> {
        Err(StoreError::Unavailable)
    }

    async fn create_document(
        &self,
        _collection: &str,
        _id: &str,
        _write: DocumentWrite,
    ) -> StoreResult<bool> {
        Err(StoreError::Unavailable)
    }

    async fn add_document(&self, _collection: &str, _write: DocumentWrite) -> StoreResult<String> {
        Err(StoreError::Unavailable)
    }

    async fn delete_document(&self, _collection: &str, _id: &str) -> StoreResult<bool> {
        Err(StoreError::Unavailable)
    }

    async fn query_by_field(
        &self,
        _collection: &str,
        _field: &str,
        _value: &Value,
    ) -> StoreResult<Vec<Document>> {
        Err(StoreError::Unavailable)
    }

    async fn query_ordered(
        &self,
        _collection: &str,
        _order_field: &str,
        _direction: Direction,
        _limit: Option<usize>,
    ) -> StoreResult<Vec<Document>> {
        Err(StoreError::Unavailable)
    }
}
