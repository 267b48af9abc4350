use crate::error::{ServiceError, ServiceResult};
use crate::models::waitlist::STATUS_PENDING;
use crate::models::{OperationResult, WaitlistEntry};
use crate::store::collections::WAITLIST;
use crate::store::{Direction, DocumentStore, DocumentWrite};
use crate::tracking::CounterService;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal shape check: one `@` with something on both sides
pub fn validate_email(email: &str) -> ServiceResult<()> {
    if email.is_empty() {
        return Err(ServiceError::Validation("Email cannot be empty".to_string()));
    }
    let mut parts = email.split('@');
    let valid = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(local), Some(domain), None)
            if !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
    );
    if valid {
        Ok(())
    } else {
        Err(ServiceError::Validation(
            "Please enter a valid email address".to_string(),
        ))
    }
}

/// Waitlist signups, at most one per normalized email.
///
/// Uniqueness rests on a query before the insert, not on a store constraint,
/// so two simultaneous signups with the same email can both get through.
pub struct WaitlistService {
    store: Arc<dyn DocumentStore>,
    counters: Arc<CounterService>,
}

impl WaitlistService {
    pub fn new(store: Arc<dyn DocumentStore>, counters: Arc<CounterService>) -> Self {
        Self { store, counters }
    }

    pub async fn add_to_waitlist(&self, email: &str, name: &str) -> OperationResult {
        match self.try_add(email, name).await {
            Ok(id) => OperationResult::created(id),
            Err(ServiceError::Duplicate) => ServiceError::Duplicate.into_result(),
            Err(e) => {
                error!("Error adding to waitlist: {}", e);
                e.into_result()
            }
        }
    }

    /// Like [`add_to_waitlist`](Self::add_to_waitlist) but keeps the error
    /// kind for callers that map it themselves
    pub async fn try_add(&self, email: &str, name: &str) -> ServiceResult<String> {
        let email = normalize_email(email);
        validate_email(&email)?;

        let existing = self
            .store
            .query_by_field(WAITLIST, "email", &Value::String(email.clone()))
            .await?;
        if !existing.is_empty() {
            info!("Rejected duplicate waitlist signup");
            return Err(ServiceError::Duplicate);
        }

        let write = DocumentWrite::new()
            .set("email", email.as_str())
            .set("name", name.trim())
            .server_timestamp("timestamp")
            .set("status", STATUS_PENDING);
        let id = self.store.add_document(WAITLIST, write).await?;

        // The entry is already stored; a failed counter update is not reconciled
        if let Err(e) = self.counters.increment_waitlist().await {
            warn!(id = %id, "Waitlist entry stored but counter update failed: {}", e);
        }

        Ok(id)
    }

    /// All signups, newest first. Failures yield an empty list.
    pub async fn list_waitlist(&self) -> Vec<WaitlistEntry> {
        match self.try_list().await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Error getting waitlist: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn try_list(&self) -> ServiceResult<Vec<WaitlistEntry>> {
        let docs = self
            .store
            .query_ordered(WAITLIST, "timestamp", Direction::Desc, None)
            .await?;

        let mut entries = Vec::with_capacity(docs.len());
        for doc in docs {
            match doc.decode::<WaitlistEntry>() {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(id = %doc.id, "Skipping malformed waitlist entry: {}", e),
            }
        }
        Ok(entries)
    }
}
