use crate::models::ClientEnvironment;
use anyhow::{bail, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Hex chars kept from the digest
const FINGERPRINT_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub visitor_id: String,
}

/// A loaded fingerprinting agent
#[async_trait]
pub trait FingerprintAgent: Send + Sync {
    async fn get(&self) -> Result<Fingerprint>;
}

#[async_trait]
pub trait Fingerprinter: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn FingerprintAgent>>;
}

/// Derives a deterministic id by hashing the client environment
#[derive(Debug, Clone)]
pub struct EnvironmentFingerprinter {
    environment: ClientEnvironment,
}

impl EnvironmentFingerprinter {
    pub fn new(environment: ClientEnvironment) -> Self {
        Self { environment }
    }
}

struct EnvironmentAgent {
    components: Vec<(&'static str, String)>,
}

#[async_trait]
impl Fingerprinter for EnvironmentFingerprinter {
    async fn load(&self) -> Result<Arc<dyn FingerprintAgent>> {
        let env = &self.environment;
        let components = vec![
            ("userAgent", env.user_agent.clone()),
            ("language", env.language.clone()),
            ("platform", env.platform.clone()),
            ("screenResolution", env.screen_resolution()),
            ("timezone", env.timezone.clone()),
            ("hardwareConcurrency", env.hardware_concurrency.to_string()),
        ];
        Ok(Arc::new(EnvironmentAgent { components }))
    }
}

#[async_trait]
impl FingerprintAgent for EnvironmentAgent {
    async fn get(&self) -> Result<Fingerprint> {
        let informative = self
            .components
            .iter()
            .filter(|(_, value)| !value.is_empty() && value != "0" && value != "0x0")
            .count();
        if informative == 0 {
            bail!("no fingerprint components available");
        }

        let mut hasher = Sha256::new();
        for (name, value) in &self.components {
            hasher.update(name.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
            hasher.update(b"\n");
        }

        let mut visitor_id = format!("{:x}", hasher.finalize());
        visitor_id.truncate(FINGERPRINT_LEN);
        Ok(Fingerprint { visitor_id })
    }
}

/// Always yields the same id
#[derive(Debug, Clone)]
pub struct StaticFingerprinter {
    visitor_id: String,
}

impl StaticFingerprinter {
    pub fn new(visitor_id: impl Into<String>) -> Self {
        Self {
            visitor_id: visitor_id.into(),
        }
    }
}

#[async_trait]
impl Fingerprinter for StaticFingerprinter {
    async fn load(&self) -> Result<Arc<dyn FingerprintAgent>> {
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl FingerprintAgent for StaticFingerprinter {
    async fn get(&self) -> Result<Fingerprint> {
        Ok(Fingerprint {
            visitor_id: self.visitor_id.clone(),
        })
    }
}

/// Fails on load, as a blocked fingerprinting script would
#[derive(Debug, Clone, Default)]
pub struct FailingFingerprinter;

#[async_trait]
impl Fingerprinter for FailingFingerprinter {
    async fn load(&self) -> Result<Arc<dyn FingerprintAgent>> {
        bail!("fingerprinting unavailable")
    }
}
