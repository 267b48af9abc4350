use crate::identity::{LocalStore, StorageKeys};
use crate::models::{LocalVisitState, LocalVisitorStats};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Classifies the current visit from timestamps cached on the device.
///
/// `is_first_visit` and `is_new_session` read the same keys that
/// `record_visit` overwrites, so evaluate them before recording.
pub struct VisitClassifier {
    local: Arc<dyn LocalStore>,
    keys: StorageKeys,
    session_idle_millis: i64,
}

impl VisitClassifier {
    pub fn new(local: Arc<dyn LocalStore>, keys: StorageKeys, session_idle_millis: i64) -> Self {
        Self {
            local,
            keys,
            session_idle_millis,
        }
    }

    fn read_millis(&self, key: &str) -> Option<i64> {
        match self.local.get(key) {
            Ok(value) => value.and_then(|v| v.trim().parse::<i64>().ok()),
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    fn has_key(&self, key: &str) -> bool {
        match self.local.get(key) {
            Ok(value) => value.is_some_and(|v| !v.is_empty()),
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                false
            }
        }
    }

    /// True iff no first-visit timestamp is cached
    pub fn is_first_visit(&self) -> bool {
        !self.has_key(&self.keys.first_visit)
    }

    /// True when there is no usable last-visit timestamp or the idle
    /// threshold has been strictly exceeded
    pub fn is_new_session(&self, now_millis: i64) -> bool {
        match self.read_millis(&self.keys.last_visit) {
            Some(last) => now_millis.saturating_sub(last) > self.session_idle_millis,
            None => true,
        }
    }

    pub fn local_state(&self) -> LocalVisitState {
        LocalVisitState {
            first_visit_at: self.read_millis(&self.keys.first_visit),
            last_visit_at: self.read_millis(&self.keys.last_visit),
            visit_count: self.visit_count(),
        }
    }

    fn visit_count(&self) -> u64 {
        self.read_millis(&self.keys.visit_count)
            .and_then(|count| u64::try_from(count).ok())
            .unwrap_or(0)
    }

    /// Update local bookkeeping for a visit happening at `now_millis` and
    /// return the new local visit count
    pub fn record_visit(&self, now_millis: i64) -> Result<u64> {
        let now = now_millis.to_string();
        if self.is_first_visit() {
            self.local.set(&self.keys.first_visit, &now)?;
        }
        self.local.set(&self.keys.last_visit, &now)?;

        let visit_count = self.visit_count() + 1;
        self.local
            .set(&self.keys.visit_count, &visit_count.to_string())?;

        Ok(visit_count)
    }

    pub fn local_visitor_stats(&self) -> LocalVisitorStats {
        let state = self.local_state();
        LocalVisitorStats {
            visitor_id: self.local.get(&self.keys.visitor_id).ok().flatten(),
            first_visit: state.first_visit_at,
            last_visit: state.last_visit_at,
            visit_count: state.visit_count,
            is_returning_visitor: !self.is_first_visit(),
        }
    }

    /// Forget everything this device knows about the visitor, id included
    pub fn clear_visitor_data(&self) -> Result<()> {
        for key in self.keys.all() {
            self.local.remove(key)?;
        }
        debug!("Visitor data cleared");
        Ok(())
    }
}
