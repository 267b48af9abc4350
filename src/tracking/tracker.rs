use crate::clock::Clock;
use crate::identity::VisitorIdResolver;
use crate::models::{ClientEnvironment, OperationResult, VisitSummary};
use crate::tracking::{CounterService, VisitClassifier};
use std::sync::Arc;
use tracing::{debug, warn};

/// Page-load visit tracking for one device.
///
/// Local bookkeeping always happens first and is never rolled back; the
/// remote counter updates are best effort.
pub struct VisitTracker {
    resolver: VisitorIdResolver,
    classifier: VisitClassifier,
    counters: Arc<CounterService>,
    clock: Arc<dyn Clock>,
    environment: ClientEnvironment,
}

impl VisitTracker {
    pub fn new(
        resolver: VisitorIdResolver,
        classifier: VisitClassifier,
        counters: Arc<CounterService>,
        clock: Arc<dyn Clock>,
        environment: ClientEnvironment,
    ) -> Self {
        Self {
            resolver,
            classifier,
            counters,
            clock,
            environment,
        }
    }

    pub fn classifier(&self) -> &VisitClassifier {
        &self.classifier
    }

    pub fn resolver(&self) -> &VisitorIdResolver {
        &self.resolver
    }

    pub fn is_first_visit(&self) -> bool {
        self.classifier.is_first_visit()
    }

    pub fn is_new_session(&self) -> bool {
        self.classifier.is_new_session(self.clock.now_millis())
    }

    /// Record a visit for `visitor_id` whose first-visit and new-session
    /// status was already evaluated by the caller
    pub async fn track_visit(
        &self,
        visitor_id: &str,
        is_first: bool,
        is_new_session: bool,
    ) -> OperationResult {
        let now = self.clock.now_millis();
        if let Err(e) = self.classifier.record_visit(now) {
            warn!("Error updating local visit state: {}", e);
            return OperationResult::failed(e.to_string());
        }

        self.counters
            .track_page_visit(visitor_id, is_first, is_new_session, &self.environment)
            .await
    }

    /// Full page-load flow: resolve the id, classify before touching local
    /// state, then record. Returns `None` only when local state could not be
    /// written.
    pub async fn track_visitor(&self) -> Option<VisitSummary> {
        let identity = self.resolver.get_visitor_id().await;
        let now = self.clock.now_millis();
        let is_first = self.classifier.is_first_visit();
        let is_new_session = self.classifier.is_new_session(now);

        let visit_count = match self.classifier.record_visit(now) {
            Ok(count) => count,
            Err(e) => {
                warn!("Error tracking visitor: {}", e);
                return None;
            }
        };

        let remote = self
            .counters
            .track_page_visit(&identity.id, is_first, is_new_session, &self.environment)
            .await;
        if !remote.success {
            debug!("Remote visit tracking skipped: {:?}", remote.error);
        }

        Some(VisitSummary {
            visitor_id: identity.id,
            is_first_visit: is_first,
            is_new_session,
            visit_count,
        })
    }
}
