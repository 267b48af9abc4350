use crate::config::StatsSeed;
use crate::models::{ClientEnvironment, OperationResult, VisitorRecord};
use crate::store::collections::{STATS, STATS_DOC, VISITORS};
use crate::store::{DocumentStore, DocumentWrite, StoreResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared counters behind the store's atomic field increments.
///
/// Branching on document existence is a read followed by a write. Creation
/// is insert-if-absent, so a stale or racing read falls through to the
/// increment path instead of replacing a live document.
pub struct CounterService {
    store: Arc<dyn DocumentStore>,
    seed: StatsSeed,
}

impl CounterService {
    pub fn new(store: Arc<dyn DocumentStore>, seed: StatsSeed) -> Self {
        Self { store, seed }
    }

    /// Count one page view, and one unique visitor when `is_first`
    pub async fn record_page_view(&self, is_first: bool) -> StoreResult<()> {
        let existing = self.store.get_document(STATS, STATS_DOC).await?;

        if existing.is_none() {
            let create = DocumentWrite::new()
                .set("uniqueVisitors", 1)
                .set("totalPageViews", 1)
                .set("linkedinFollowers", self.seed.linkedin_followers)
                .set("waitlistCount", self.seed.waitlist_count)
                .server_timestamp("lastUpdated");
            if self.store.create_document(STATS, STATS_DOC, create).await? {
                debug!("Created aggregate stats document");
                return Ok(());
            }
            // Created concurrently or the read was stale: count onto it
        }

        let mut write = DocumentWrite::new()
            .increment("totalPageViews", 1)
            .server_timestamp("lastUpdated");
        if is_first {
            write = write.increment("uniqueVisitors", 1);
        }
        self.store.set_document(STATS, STATS_DOC, write, true).await
    }

    /// Create or update the per-visitor record. Skipped unless the visit is
    /// a first visit or opens a new session.
    pub async fn record_visitor(
        &self,
        visitor_id: &str,
        is_first: bool,
        is_new_session: bool,
        environment: &ClientEnvironment,
    ) -> StoreResult<()> {
        if !(is_first || is_new_session) {
            return Ok(());
        }

        let existing = self.store.get_document(VISITORS, visitor_id).await?;

        if existing.is_none() {
            let record = VisitorRecord {
                visitor_id: visitor_id.to_string(),
                visit_count: 1,
                sessions: 1,
                user_agent: environment.user_agent.clone(),
                language: environment.language.clone(),
                platform: environment.platform.clone(),
                screen_resolution: environment.screen_resolution(),
                ..VisitorRecord::default()
            };
            let create = record
                .to_write()?
                .server_timestamp("firstVisit")
                .server_timestamp("lastVisit");
            if self.store.create_document(VISITORS, visitor_id, create).await? {
                return Ok(());
            }
        }

        let mut write = DocumentWrite::new()
            .server_timestamp("lastVisit")
            .increment("visitCount", 1);
        if is_new_session {
            write = write.increment("sessions", 1);
        }
        self.store.set_document(VISITORS, visitor_id, write, true).await
    }

    pub async fn increment_waitlist(&self) -> StoreResult<()> {
        let write = DocumentWrite::new()
            .increment("waitlistCount", 1)
            .server_timestamp("lastUpdated");
        self.store.set_document(STATS, STATS_DOC, write, true).await
    }

    /// Remote half of visit tracking. Failures are logged and reported, never
    /// propagated.
    pub async fn track_page_visit(
        &self,
        visitor_id: &str,
        is_first: bool,
        is_new_session: bool,
        environment: &ClientEnvironment,
    ) -> OperationResult {
        let result: StoreResult<()> = async {
            self.record_page_view(is_first).await?;
            self.record_visitor(visitor_id, is_first, is_new_session, environment)
                .await
        }
        .await;

        match result {
            Ok(()) => OperationResult::ok(),
            Err(e) => {
                warn!(visitor_id, "Error tracking page visit: {}", e);
                OperationResult::failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CachedStore, MemoryStore, UnavailableStore};

    fn env() -> ClientEnvironment {
        ClientEnvironment {
            user_agent: "Mozilla/5.0".to_string(),
            language: "en-US".to_string(),
            platform: "MacIntel".to_string(),
            screen_width: 1440,
            screen_height: 900,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_returning_visit_in_same_session_skips_visitor_record() {
        let store = Arc::new(MemoryStore::new());
        let counters = CounterService::new(store.clone(), StatsSeed::default());

        let result = counters.track_page_visit("v1", false, false, &env()).await;
        assert!(result.success);
        assert!(store.get_document(VISITORS, "v1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_new_visitor_record_captures_environment() {
        let store = Arc::new(MemoryStore::new());
        let counters = CounterService::new(store.clone(), StatsSeed::default());

        counters.record_visitor("v1", true, true, &env()).await.unwrap();

        let doc = store.get_document(VISITORS, "v1").await.unwrap().unwrap();
        let record: VisitorRecord = doc.decode().unwrap();
        assert_eq!(record.visitor_id, "v1");
        assert_eq!(record.visit_count, 1);
        assert_eq!(record.sessions, 1);
        assert_eq!(record.screen_resolution, "1440x900");
        assert_eq!(record.platform, "MacIntel");
        assert!(record.first_visit.is_some());
        assert_eq!(record.first_visit, record.last_visit);
    }

    #[tokio::test]
    async fn test_existing_visitor_counts_session_only_when_new() {
        let store = Arc::new(MemoryStore::new());
        let counters = CounterService::new(store.clone(), StatsSeed::default());
        counters.record_visitor("v1", true, true, &env()).await.unwrap();

        // First-visit flag without a new session (local storage cleared mid-session)
        counters.record_visitor("v1", true, false, &env()).await.unwrap();
        counters.record_visitor("v1", false, true, &env()).await.unwrap();

        let doc = store.get_document(VISITORS, "v1").await.unwrap().unwrap();
        assert_eq!(doc.get_i64("visitCount"), Some(3));
        assert_eq!(doc.get_i64("sessions"), Some(2));
    }

    #[tokio::test]
    async fn test_seed_values_come_from_config() {
        let store = Arc::new(MemoryStore::new());
        let seed = StatsSeed {
            linkedin_followers: 43,
            waitlist_count: 5,
        };
        let counters = CounterService::new(store.clone(), seed);

        counters.record_page_view(false).await.unwrap();

        let doc = store.get_document(STATS, STATS_DOC).await.unwrap().unwrap();
        assert_eq!(doc.get_i64("uniqueVisitors"), Some(1));
        assert_eq!(doc.get_i64("totalPageViews"), Some(1));
        assert_eq!(doc.get_i64("linkedinFollowers"), Some(43));
        assert_eq!(doc.get_i64("waitlistCount"), Some(5));
    }

    #[tokio::test]
    async fn test_stale_missing_read_never_replaces_live_stats() {
        let inner: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let here = CounterService::new(
            Arc::new(CachedStore::new(Arc::clone(&inner), 100, 300)),
            StatsSeed::default(),
        );
        let elsewhere = CounterService::new(
            Arc::new(CachedStore::new(Arc::clone(&inner), 100, 300)),
            StatsSeed::default(),
        );

        // Warm this instance's cache while the aggregate is still missing
        assert!(here.store.get_document(STATS, STATS_DOC).await.unwrap().is_none());

        for i in 0..5 {
            let visitor = format!("v{i}");
            elsewhere
                .track_page_visit(&visitor, true, true, &env())
                .await;
        }
        elsewhere.increment_waitlist().await.unwrap();

        assert!(here.track_page_visit("v0", false, false, &env()).await.success);

        let doc = inner.get_document(STATS, STATS_DOC).await.unwrap().unwrap();
        assert_eq!(doc.get_i64("totalPageViews"), Some(6));
        assert_eq!(doc.get_i64("uniqueVisitors"), Some(5));
        assert_eq!(doc.get_i64("waitlistCount"), Some(1));
    }

    #[tokio::test]
    async fn test_unavailable_store_reports_failure() {
        let counters = CounterService::new(Arc::new(UnavailableStore), StatsSeed::default());
        let result = counters.track_page_visit("v1", true, true, &env()).await;
        assert!(!result.success);
        assert!(result.error.is_some());
    }
}
