use crate::store::DocumentWrite;
use serde::{Deserialize, Serialize};

/// Prefix that marks an id synthesized without a fingerprint
pub const FALLBACK_ID_PREFIX: &str = "visitor_";

/// Stable anonymous identifier for one browser or device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorIdentity {
    pub id: String,
    pub is_fallback: bool,
}

impl VisitorIdentity {
    /// Rebuild an identity from a cached id
    pub fn from_cached(id: String) -> Self {
        let is_fallback = id.starts_with(FALLBACK_ID_PREFIX);
        Self { id, is_fallback }
    }
}

/// Visit bookkeeping owned by the local device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalVisitState {
    pub first_visit_at: Option<i64>,
    pub last_visit_at: Option<i64>,
    pub visit_count: u64,
}

/// Local visitor information for display
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalVisitorStats {
    pub visitor_id: Option<String>,
    pub first_visit: Option<i64>,
    pub last_visit: Option<i64>,
    pub visit_count: u64,
    pub is_returning_visitor: bool,
}

/// Result of tracking one page load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitSummary {
    pub visitor_id: String,
    pub is_first_visit: bool,
    pub is_new_session: bool,
    pub visit_count: u64,
}

/// Environment metadata captured when a visitor record is first created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientEnvironment {
    pub user_agent: String,
    pub language: String,
    pub platform: String,
    pub screen_width: u32,
    pub screen_height: u32,
    pub timezone: String,
    pub hardware_concurrency: u32,
}

impl ClientEnvironment {
    pub fn screen_resolution(&self) -> String {
        format!("{}x{}", self.screen_width, self.screen_height)
    }

    /// Describe the machine this process runs on
    pub fn detect() -> Self {
        let language = std::env::var("LANG")
            .ok()
            .and_then(|lang| lang.split('.').next().map(|l| l.replace('_', "-")))
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| "en-US".to_string());

        let timezone = std::env::var("TZ").unwrap_or_else(|_| "UTC".to_string());

        let hardware_concurrency = std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1);

        Self {
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            language,
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            screen_width: 0,
            screen_height: 0,
            timezone,
            hardware_concurrency,
        }
    }
}

/// Per-visitor document in the `visitors` collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisitorRecord {
    pub visitor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_visit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_visit: Option<i64>,
    pub visit_count: i64,
    pub sessions: i64,
    pub user_agent: String,
    pub language: String,
    pub platform: String,
    pub screen_resolution: String,
}

impl VisitorRecord {
    /// Write setting every field of the record. Unset timestamps are left out
    /// so the caller can have the store stamp them.
    pub fn to_write(&self) -> serde_json::Result<DocumentWrite> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(fields) => Ok(DocumentWrite::from_fields(fields)),
            _ => Ok(DocumentWrite::new()),
        }
    }
}
