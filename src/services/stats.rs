use crate::config::StatsSeed;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{AggregateStats, ManualStatsUpdate, OperationResult};
use crate::store::collections::{STATS, STATS_DOC};
use crate::store::{DocumentStore, DocumentWrite};
use std::sync::Arc;
use tracing::error;

pub struct StatsService {
    store: Arc<dyn DocumentStore>,
    display_defaults: StatsSeed,
}

impl StatsService {
    pub fn new(store: Arc<dyn DocumentStore>, display_defaults: StatsSeed) -> Self {
        Self {
            store,
            display_defaults,
        }
    }

    /// What the public site shows before any visit has been counted
    pub fn default_stats(&self) -> AggregateStats {
        AggregateStats {
            linkedin_followers: self.display_defaults.linkedin_followers,
            waitlist_count: self.display_defaults.waitlist_count,
            ..AggregateStats::default()
        }
    }

    /// Current stats; defaults when the document is missing or unreadable
    pub async fn get_stats(&self) -> AggregateStats {
        match self.try_get().await {
            Ok(Some(stats)) => stats,
            Ok(None) => self.default_stats(),
            Err(e) => {
                error!("Error getting stats: {}", e);
                self.default_stats()
            }
        }
    }

    pub async fn try_get(&self) -> ServiceResult<Option<AggregateStats>> {
        let doc = self.store.get_document(STATS, STATS_DOC).await?;
        Ok(doc.map(|d| d.decode()).transpose()?)
    }

    /// Overwrite the manually tracked counters that were provided
    pub async fn update_stats(&self, update: &ManualStatsUpdate) -> OperationResult {
        match self.try_update(update).await {
            Ok(()) => OperationResult::ok(),
            Err(e) => {
                error!("Error updating stats: {}", e);
                e.into_result()
            }
        }
    }

    pub async fn try_update(&self, update: &ManualStatsUpdate) -> ServiceResult<()> {
        let fields = update.provided();
        if let Some((field, _)) = fields.iter().find(|(_, v)| *v < 0) {
            return Err(ServiceError::Validation(format!(
                "{field} cannot be negative"
            )));
        }

        let write = fields
            .into_iter()
            .fold(DocumentWrite::new(), |write, (field, value)| {
                write.set(field, value)
            })
            .server_timestamp("lastUpdated");

        self.store.set_document(STATS, STATS_DOC, write, true).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_missing_document_returns_display_defaults() {
        let defaults = StatsSeed {
            linkedin_followers: 1250,
            waitlist_count: 387,
        };
        let service = StatsService::new(Arc::new(MemoryStore::new()), defaults);

        let stats = service.get_stats().await;
        assert_eq!(stats.linkedin_followers, 1250);
        assert_eq!(stats.waitlist_count, 387);
        assert_eq!(stats.unique_visitors, 0);
        assert_eq!(stats.total_page_views, 0);
    }

    #[tokio::test]
    async fn test_update_only_touches_provided_fields() {
        let store = Arc::new(MemoryStore::new());
        store
            .set_document(
                STATS,
                STATS_DOC,
                DocumentWrite::new()
                    .set("totalPageViews", 10)
                    .set("linkedinFollowers", 5)
                    .set("productInterest", 2),
                false,
            )
            .await
            .unwrap();
        let service = StatsService::new(store, StatsSeed::default());

        let result = service
            .update_stats(&ManualStatsUpdate {
                linkedin_followers: Some(99),
                ..Default::default()
            })
            .await;
        assert!(result.success);

        let stats = service.get_stats().await;
        assert_eq!(stats.linkedin_followers, 99);
        assert_eq!(stats.product_interest, 2);
        assert_eq!(stats.total_page_views, 10);
        assert!(stats.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_negative_values_are_rejected() {
        let service = StatsService::new(Arc::new(MemoryStore::new()), StatsSeed::default());
        let result = service
            .update_stats(&ManualStatsUpdate {
                product_interest: Some(-1),
                ..Default::default()
            })
            .await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("productInterest cannot be negative")
        );
    }
}
