use serde::{Deserialize, Serialize};

/// Status every new signup starts with
pub const STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistEntry {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    /// Unix epoch milliseconds assigned by the store
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    STATUS_PENDING.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaitlistRequest {
    pub email: String,
    #[serde(default)]
    pub name: String,
}
