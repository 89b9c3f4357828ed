mod category;
mod prompt;

use serde::Deserialize;

pub use category::{
    Category, UNCATEGORIZED_ID, UNCATEGORIZED_NAME, UNCATEGORIZED_SORT_WEIGHT,
};
pub use prompt::{Prompt, GUIDE_ID_SUFFIX, GUIDE_TITLE_MARKER};

const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Compiled-in dataset used to seed an empty or version-mismatched store.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DefaultDataset {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub prompts: Vec<Prompt>,
}

pub fn default_dataset() -> Result<DefaultDataset, toml::de::Error> {
    let mut dataset: DefaultDataset = toml::from_str(DEFAULTS_TOML)?;
    for prompt in &mut dataset.prompts {
        prompt.normalize_guide_flag();
    }
    Ok(dataset)
}
