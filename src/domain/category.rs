use serde::{Deserialize, Serialize};

/// Reserved id of the synthetic bucket that collects prompts without a
/// resolvable category. Never persisted.
pub const UNCATEGORIZED_ID: &str = "__uncategorized__";
pub const UNCATEGORIZED_NAME: &str = "未分类";
/// Sort weight that places the bucket after every ordinary category.
pub const UNCATEGORIZED_SORT_WEIGHT: i64 = 9_999;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Category {
    /// Category-shaped value for the uncategorized bucket, materialized at
    /// projection time only.
    pub fn uncategorized() -> Self {
        Self {
            id: UNCATEGORIZED_ID.to_string(),
            name: UNCATEGORIZED_NAME.to_string(),
            description: None,
            icon: None,
            sort_order: Some(UNCATEGORIZED_SORT_WEIGHT),
            created_at: None,
        }
    }
}
