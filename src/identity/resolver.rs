use crate::clock::Clock;
use crate::identity::{Fingerprinter, LocalStore, StorageKeys};
use crate::models::visitor::FALLBACK_ID_PREFIX;
use crate::models::VisitorIdentity;
use anyhow::Result;
use rand::RngExt;
use std::sync::Arc;
use tracing::{debug, warn};

const FALLBACK_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Resolves the anonymous visitor id for this device.
///
/// The id is cached in the local store; fingerprinting only runs on a cache
/// miss, and a failed fingerprint falls back to a time-plus-random id.
pub struct VisitorIdResolver {
    local: Arc<dyn LocalStore>,
    fingerprinter: Arc<dyn Fingerprinter>,
    clock: Arc<dyn Clock>,
    keys: StorageKeys,
}

impl VisitorIdResolver {
    pub fn new(
        local: Arc<dyn LocalStore>,
        fingerprinter: Arc<dyn Fingerprinter>,
        clock: Arc<dyn Clock>,
        keys: StorageKeys,
    ) -> Self {
        Self {
            local,
            fingerprinter,
            clock,
            keys,
        }
    }

    /// Never fails; the worst case is an uncached fallback id
    pub async fn get_visitor_id(&self) -> VisitorIdentity {
        match self.local.get(&self.keys.visitor_id) {
            Ok(Some(id)) if !id.is_empty() => return VisitorIdentity::from_cached(id),
            Ok(_) => {}
            Err(e) => warn!("Failed to read cached visitor id: {}", e),
        }

        let identity = match self.fingerprint().await {
            Ok(id) => VisitorIdentity {
                id,
                is_fallback: false,
            },
            Err(e) => {
                debug!("Fingerprinting failed, using fallback id: {}", e);
                VisitorIdentity {
                    id: fallback_visitor_id(self.clock.now_millis()),
                    is_fallback: true,
                }
            }
        };

        if let Err(e) = self.local.set(&self.keys.visitor_id, &identity.id) {
            warn!("Failed to cache visitor id: {}", e);
        }

        identity
    }

    async fn fingerprint(&self) -> Result<String> {
        let agent = self.fingerprinter.load().await?;
        let fingerprint = agent.get().await?;
        if fingerprint.visitor_id.trim().is_empty() {
            anyhow::bail!("fingerprint produced an empty id");
        }
        Ok(fingerprint.visitor_id)
    }
}

/// `visitor_<millis>_<9 base-36 chars>`
pub fn fallback_visitor_id(now_millis: i64) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..FALLBACK_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("{FALLBACK_ID_PREFIX}{now_millis}_{suffix}")
}
