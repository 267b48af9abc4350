use serde::{Deserialize, Serialize};

/// Site-wide counters kept in the single `stats/main` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregateStats {
    pub unique_visitors: i64,
    pub total_page_views: i64,
    pub waitlist_count: i64,
    pub linkedin_followers: i64,
    pub linkedin_page_views: i64,
    pub product_interest: i64,
    /// Unix epoch milliseconds of the last write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
}

/// Manually tracked counters an administrator may overwrite
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualStatsUpdate {
    pub linkedin_followers: Option<i64>,
    pub linkedin_page_views: Option<i64>,
    pub product_interest: Option<i64>,
}

impl ManualStatsUpdate {
    /// Provided fields as (document field, value) pairs
    pub fn provided(&self) -> Vec<(&'static str, i64)> {
        [
            ("linkedinFollowers", self.linkedin_followers),
            ("linkedinPageViews", self.linkedin_page_views),
            ("productInterest", self.product_interest),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
        .collect()
    }
}
