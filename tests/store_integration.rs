//! Document store integration tests
//!
//! The same behavioral checks run against every adapter. Filter with
//! `DATABASE_BACKEND=memory|sqlite|postgres`; PostgreSQL runs only when
//! `DATABASE_URL` points at a postgres database.

use conversy::config::StatsSeed;
use conversy::error::GENERIC_FAILURE_MESSAGE;
use conversy::services::{StatsService, WaitlistService};
use conversy::store::{
    Direction, DocumentStore, DocumentWrite, MemoryStore, PostgresStore, SqliteStore,
    StoreError, UnavailableStore,
};
use conversy::tracking::CounterService;
use serde_json::json;
use std::sync::Arc;

fn should_test_backend(backend: &str) -> bool {
    match std::env::var("DATABASE_BACKEND") {
        Ok(val) => val.to_lowercase() == backend.to_lowercase(),
        Err(_) => true,
    }
}

async fn create_sqlite_store() -> Arc<dyn DocumentStore> {
    let store = SqliteStore::new("sqlite::memory:", 1).await.unwrap();
    store.init().await.unwrap();
    Arc::new(store)
}

async fn create_postgres_store() -> Option<Arc<dyn DocumentStore>> {
    let db_url = std::env::var("DATABASE_URL").ok()?;
    if !db_url.starts_with("postgres") {
        return None;
    }
    let store = PostgresStore::new(&db_url, 5).await.ok()?;
    store.init().await.ok()?;
    Some(Arc::new(store))
}

/// Collection name unique to one test run, so a shared database stays usable
fn scratch_collection(name: &str) -> String {
    format!("test_{}_{}", name, rand::random::<u32>())
}

async fn run_merge_and_overwrite(store: Arc<dyn DocumentStore>) {
    let col = scratch_collection("merge");

    let write = DocumentWrite::new().set("a", 1).set("b", "two");
    store.set_document(&col, "doc", write, false).await.unwrap();

    store
        .set_document(&col, "doc", DocumentWrite::new().set("c", true), true)
        .await
        .unwrap();
    let doc = store.get_document(&col, "doc").await.unwrap().unwrap();
    assert_eq!(doc.get("a"), Some(&json!(1)));
    assert_eq!(doc.get("b"), Some(&json!("two")));
    assert_eq!(doc.get("c"), Some(&json!(true)));

    store
        .set_document(&col, "doc", DocumentWrite::new().set("c", false), false)
        .await
        .unwrap();
    let doc = store.get_document(&col, "doc").await.unwrap().unwrap();
    assert_eq!(doc.get("a"), None);
    assert_eq!(doc.get("c"), Some(&json!(false)));
}

async fn run_increments(store: Arc<dyn DocumentStore>) {
    let col = scratch_collection("inc");

    // Merge-increment on a missing document starts from zero
    let write = DocumentWrite::new().increment("views", 3).server_timestamp("at");
    store.set_document(&col, "doc", write, true).await.unwrap();
    let doc = store.get_document(&col, "doc").await.unwrap().unwrap();
    assert_eq!(doc.get_i64("views"), Some(3));
    assert!(doc.get_i64("at").is_some());

    let mut handles = Vec::new();
    for _ in 0..25 {
        let store = Arc::clone(&store);
        let col = col.clone();
        handles.push(tokio::spawn(async move {
            store
                .set_document(&col, "doc", DocumentWrite::new().increment("views", 1), true)
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let doc = store.get_document(&col, "doc").await.unwrap().unwrap();
    assert_eq!(doc.get_i64("views"), Some(28));
}

async fn run_queries(store: Arc<dyn DocumentStore>) {
    let col = scratch_collection("query");

    for (email, ts) in [("a@x.com", 10), ("b@x.com", 30), ("c@x.com", 20)] {
        let write = DocumentWrite::new().set("email", email).set("ts", ts);
        store.add_document(&col, write).await.unwrap();
    }
    // Missing the order field: never part of an ordered listing
    store
        .add_document(&col, DocumentWrite::new().set("email", "d@x.com"))
        .await
        .unwrap();

    let found = store
        .query_by_field(&col, "email", &json!("b@x.com"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get_i64("ts"), Some(30));

    let none = store
        .query_by_field(&col, "email", &json!("zzz@x.com"))
        .await
        .unwrap();
    assert!(none.is_empty());

    let desc = store
        .query_ordered(&col, "ts", Direction::Desc, Some(2))
        .await
        .unwrap();
    let ts: Vec<i64> = desc.iter().filter_map(|d| d.get_i64("ts")).collect();
    assert_eq!(ts, vec![30, 20]);

    let asc = store
        .query_ordered(&col, "ts", Direction::Asc, None)
        .await
        .unwrap();
    let ts: Vec<i64> = asc.iter().filter_map(|d| d.get_i64("ts")).collect();
    assert_eq!(ts, vec![10, 20, 30]);
}

async fn run_delete(store: Arc<dyn DocumentStore>) {
    let col = scratch_collection("delete");
    let id = store
        .add_document(&col, DocumentWrite::new().set("x", 1))
        .await
        .unwrap();

    assert!(store.delete_document(&col, &id).await.unwrap());
    assert!(!store.delete_document(&col, &id).await.unwrap());
    assert!(store.get_document(&col, &id).await.unwrap().is_none());
}

async fn run_create_if_absent(store: Arc<dyn DocumentStore>) {
    let col = scratch_collection("create");

    let first = DocumentWrite::new().set("views", 5).server_timestamp("at");
    assert!(store.create_document(&col, "main", first).await.unwrap());

    let second = DocumentWrite::new().set("views", 1);
    assert!(!store.create_document(&col, "main", second).await.unwrap());

    let doc = store.get_document(&col, "main").await.unwrap().unwrap();
    assert_eq!(doc.get_i64("views"), Some(5));
    assert!(doc.get_i64("at").is_some());
}

async fn run_all(store: Arc<dyn DocumentStore>) {
    run_merge_and_overwrite(Arc::clone(&store)).await;
    run_create_if_absent(Arc::clone(&store)).await;
    run_increments(Arc::clone(&store)).await;
    run_queries(Arc::clone(&store)).await;
    run_delete(store).await;
}

#[tokio::test]
async fn test_memory_store() {
    if !should_test_backend("memory") {
        return;
    }
    run_all(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn test_sqlite_store() {
    if !should_test_backend("sqlite") {
        return;
    }
    run_all(create_sqlite_store().await).await;
}

#[tokio::test]
async fn test_postgres_store() {
    if !should_test_backend("postgres") {
        return;
    }
    let Some(store) = create_postgres_store().await else {
        return;
    };
    run_all(store).await;
}

#[tokio::test]
async fn test_invalid_field_names_are_rejected() {
    if !should_test_backend("sqlite") {
        return;
    }
    let store = create_sqlite_store().await;
    let err = store
        .query_by_field("things", "email') OR 1=1 --", &json!("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidField(_)));
}

#[tokio::test]
async fn test_unavailable_store_degrades_to_defaults() {
    let store: Arc<dyn DocumentStore> = Arc::new(UnavailableStore);
    let counters = Arc::new(CounterService::new(Arc::clone(&store), StatsSeed::default()));

    let stats = StatsService::new(
        Arc::clone(&store),
        StatsSeed {
            linkedin_followers: 150,
            waitlist_count: 12,
        },
    );
    let shown = stats.get_stats().await;
    assert_eq!(shown.linkedin_followers, 150);
    assert_eq!(shown.waitlist_count, 12);
    assert_eq!(shown.unique_visitors, 0);

    let waitlist = WaitlistService::new(Arc::clone(&store), Arc::clone(&counters));
    let result = waitlist.add_to_waitlist("someone@example.com", "").await;
    assert!(!result.success);
    assert!(!result.is_duplicate);
    assert_eq!(result.error.as_deref(), Some(GENERIC_FAILURE_MESSAGE));
    assert!(waitlist.list_waitlist().await.is_empty());

    let visit = counters
        .track_page_visit("v1", true, true, &Default::default())
        .await;
    assert!(!visit.success);
}
