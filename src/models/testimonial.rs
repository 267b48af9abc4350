use serde::{Deserialize, Serialize};

pub const DEFAULT_RATING: i64 = 5;

fn default_rating() -> i64 {
    DEFAULT_RATING
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    pub content: String,
    #[serde(default = "default_rating")]
    pub rating: i64,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

/// Fields an administrator submits when adding or editing a testimonial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialInput {
    pub name: String,
    #[serde(default)]
    pub role: String,
    pub content: String,
    #[serde(default = "default_rating")]
    pub rating: i64,
    #[serde(default)]
    pub image: String,
}

impl TestimonialInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name cannot be empty".to_string());
        }
        if self.content.trim().is_empty() {
            return Err("Content cannot be empty".to_string());
        }
        if !(1..=5).contains(&self.rating) {
            return Err("Rating must be between 1 and 5".to_string());
        }
        Ok(())
    }
}
