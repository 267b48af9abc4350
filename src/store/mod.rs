pub mod cached;
pub mod document;
pub mod memory;
pub mod postgres;
pub mod sqlite;
pub mod trait_def;
pub mod unavailable;

pub use cached::CachedStore;
pub use document::{Direction, Document, DocumentWrite, FieldValue, Fields};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;
pub use trait_def::{DocumentStore, StoreError, StoreResult};
pub use unavailable::UnavailableStore;

/// Collection names shared by the services
pub mod collections {
    pub const WAITLIST: &str = "waitlist";
    pub const INTERVIEWS: &str = "interviews";
    pub const STATS: &str = "stats";
    pub const VISITORS: &str = "visitors";

    /// Id of the single aggregate stats document
    pub const STATS_DOC: &str = "main";
}

use crate::config::{CacheConfig, DatabaseBackend, DatabaseConfig};
use std::sync::Arc;
use tracing::{error, info};

/// Open the configured backend and initialise it
pub async fn connect(database: &DatabaseConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match database.backend {
        DatabaseBackend::Memory => {
            info!("Using in-memory document store");
            Arc::new(MemoryStore::new())
        }
        DatabaseBackend::Sqlite => {
            info!("Using SQLite document store: {}", database.url);
            Arc::new(SqliteStore::new(&database.url, database.max_connections).await?)
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL document store: {}", database.url);
            Arc::new(PostgresStore::new(&database.url, database.max_connections).await?)
        }
    };

    store.init().await?;
    Ok(store)
}

/// Like [`connect`], but a backend that cannot be reached is replaced with
/// [`UnavailableStore`] so callers keep running and report failures per call.
/// The result is wrapped in a read cache.
pub async fn connect_or_unavailable(
    database: &DatabaseConfig,
    cache: &CacheConfig,
) -> Arc<dyn DocumentStore> {
    let inner: Arc<dyn DocumentStore> = match connect(database).await {
        Ok(store) => store,
        Err(e) => {
            error!("Document store initialization failed: {:#}", e);
            Arc::new(UnavailableStore)
        }
    };

    Arc::new(CachedStore::new(inner, cache.max_entries, cache.ttl_secs))
}
