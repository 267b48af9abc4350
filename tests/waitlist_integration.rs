//! Waitlist integration tests
//!
//! Run against the in-memory store and SQLite. Set `DATABASE_BACKEND` to
//! restrict which backend runs; PostgreSQL additionally needs `DATABASE_URL`.

use conversy::config::StatsSeed;
use conversy::error::DUPLICATE_EMAIL_MESSAGE;
use conversy::services::WaitlistService;
use conversy::store::collections::{STATS, STATS_DOC, WAITLIST};
use conversy::store::{DocumentStore, MemoryStore, PostgresStore, SqliteStore};
use conversy::tracking::CounterService;
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

fn waitlist_service(store: &Arc<dyn DocumentStore>) -> WaitlistService {
    let counters = Arc::new(CounterService::new(Arc::clone(store), StatsSeed::default()));
    WaitlistService::new(Arc::clone(store), counters)
}

async fn waitlist_count(store: &Arc<dyn DocumentStore>) -> Option<i64> {
    store
        .get_document(STATS, STATS_DOC)
        .await
        .unwrap()
        .and_then(|doc| doc.get_i64("waitlistCount"))
}

async fn run_duplicate_rejection(store: Arc<dyn DocumentStore>) {
    let service = waitlist_service(&store);

    let first = service.add_to_waitlist("Foo@Bar.com", "Foo").await;
    assert!(first.success);
    assert!(!first.is_duplicate);
    assert!(first.id.is_some());
    assert_eq!(waitlist_count(&store).await, Some(1));

    let second = service.add_to_waitlist("foo@bar.com ", "Foo again").await;
    assert!(!second.success);
    assert!(second.is_duplicate);
    assert_eq!(second.error.as_deref(), Some(DUPLICATE_EMAIL_MESSAGE));

    // Nothing stored and nothing counted for the duplicate
    let entries = service.list_waitlist().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].email, "foo@bar.com");
    assert_eq!(entries[0].status, "pending");
    assert_eq!(waitlist_count(&store).await, Some(1));
}

async fn run_newest_first_listing(store: Arc<dyn DocumentStore>) {
    let service = waitlist_service(&store);

    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        assert!(service.add_to_waitlist(email, "").await.success);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let emails: Vec<String> = service
        .list_waitlist()
        .await
        .into_iter()
        .map(|e| e.email)
        .collect();
    assert_eq!(emails, vec!["c@example.com", "b@example.com", "a@example.com"]);
    assert_eq!(waitlist_count(&store).await, Some(3));
}

#[tokio::test]
async fn test_duplicate_rejection_memory() {
    if !should_test_backend("memory") {
        return;
    }
    run_duplicate_rejection(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn test_duplicate_rejection_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }
    run_duplicate_rejection(create_sqlite_store().await).await;
}

#[tokio::test]
async fn test_duplicate_rejection_postgres() {
    if !should_test_backend("postgres") {
        return;
    }
    let Some(store) = create_postgres_store().await else {
        return;
    };
    // Shared database: start from a clean collection
    for entry in store.query_by_field(WAITLIST, "email", &"foo@bar.com".into()).await.unwrap() {
        store.delete_document(WAITLIST, &entry.id).await.unwrap();
    }
    let service = waitlist_service(&store);
    assert!(service.add_to_waitlist("Foo@Bar.com", "Foo").await.success);
    assert!(service.add_to_waitlist("foo@bar.com ", "").await.is_duplicate);
}

#[tokio::test]
async fn test_newest_first_listing_memory() {
    if !should_test_backend("memory") {
        return;
    }
    run_newest_first_listing(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn test_newest_first_listing_sqlite() {
    if !should_test_backend("sqlite") {
        return;
    }
    run_newest_first_listing(create_sqlite_store().await).await;
}

#[tokio::test]
async fn test_invalid_email_is_rejected_without_write() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let service = waitlist_service(&store);

    let result = service.add_to_waitlist("not-an-email", "").await;
    assert!(!result.success);
    assert!(!result.is_duplicate);
    assert!(service.list_waitlist().await.is_empty());
    assert_eq!(waitlist_count(&store).await, None);
}

#[tokio::test]
async fn test_concurrent_signups_are_all_counted() {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let service = Arc::new(waitlist_service(&store));

    let mut handles = Vec::new();
    for i in 0..20 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .add_to_waitlist(&format!("user{i}@example.com"), "")
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().success);
    }

    assert_eq!(waitlist_count(&store).await, Some(20));
}
