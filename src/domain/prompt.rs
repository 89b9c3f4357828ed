use serde::{Deserialize, Serialize};

/// Legacy convention: a prompt whose id carries this suffix is the category guide.
pub const GUIDE_ID_SUFFIX: &str = ".guide";
/// Legacy convention: a prompt whose title carries this marker is the category guide.
pub const GUIDE_TITLE_MARKER: &str = "【指南】";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Prompt {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub is_guide: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Prompt {
    pub fn tag_list(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }

    pub fn matches_guide_convention(&self) -> bool {
        self.id.ends_with(GUIDE_ID_SUFFIX) || self.title.contains(GUIDE_TITLE_MARKER)
    }

    /// One-time migration for records that predate the explicit flag: promote
    /// the naming convention to `is_guide` whenever a container is decoded.
    pub fn normalize_guide_flag(&mut self) {
        if !self.is_guide && self.matches_guide_convention() {
            self.is_guide = true;
        }
    }
}
