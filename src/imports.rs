use std::collections::HashSet;
use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::{Category, Prompt};
use crate::repo::{PromptRepository, RepoError};
use crate::store;

pub const EXPORT_FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportDocument {
    pub version: String,
    pub exported_at: String,
    pub prompts: Vec<Prompt>,
    pub categories: Vec<Category>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportSummary {
    pub prompts_imported: u64,
    pub prompts_skipped: u64,
    pub categories_imported: u64,
}

pub fn export(repo: &PromptRepository) -> Result<ExportDocument, ImportError> {
    let prompts = repo.try_prompts()?;
    let categories = repo.try_categories()?;

    let mut metadata = serde_json::Map::new();
    metadata.insert(
        "generator".to_string(),
        Value::String(format!("promptdeck {}", env!("CARGO_PKG_VERSION"))),
    );
    metadata.insert("prompt_count".to_string(), Value::from(prompts.len()));
    metadata.insert("category_count".to_string(), Value::from(categories.len()));

    Ok(ExportDocument {
        version: EXPORT_FORMAT_VERSION.to_string(),
        exported_at: store::now_utc_rfc3339(),
        prompts,
        categories,
        metadata,
    })
}

pub fn parse_document(json: &str) -> Result<ExportDocument, ImportError> {
    serde_json::from_str(json).map_err(ImportError::Parse)
}

/// Merges a document into the store. Incoming prompts are fingerprinted over
/// title and content; a prompt whose fingerprint is already stored is skipped,
/// so re-importing the same export is a no-op. Categories merge by id and the
/// local record wins on collision.
pub fn import(repo: &PromptRepository, document: &ExportDocument) -> Result<ImportSummary, ImportError> {
    if !document.version.starts_with("1.") {
        return Err(ImportError::UnsupportedVersion(document.version.clone()));
    }

    let existing_categories: HashSet<String> = repo
        .try_categories()?
        .into_iter()
        .map(|c| c.id)
        .collect();
    let mut categories_imported = 0u64;
    for category in &document.categories {
        if existing_categories.contains(&category.id) {
            continue;
        }
        repo.save_category(category.clone())?;
        categories_imported += 1;
    }

    let mut seen: HashSet<String> = repo
        .try_prompts()?
        .iter()
        .map(fingerprint)
        .collect();
    let mut prompts_imported = 0u64;
    let mut prompts_skipped = 0u64;
    for prompt in &document.prompts {
        let token = fingerprint(prompt);
        if seen.contains(&token) {
            prompts_skipped += 1;
            continue;
        }
        let mut incoming = prompt.clone();
        incoming.normalize_guide_flag();
        repo.save_prompt(incoming)?;
        seen.insert(token);
        prompts_imported += 1;
    }

    Ok(ImportSummary {
        prompts_imported,
        prompts_skipped,
        categories_imported,
    })
}

pub fn fingerprint(prompt: &Prompt) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.title.as_bytes());
    hasher.update(b"\n");
    hasher.update(prompt.content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug)]
pub enum ImportError {
    Parse(serde_json::Error),
    UnsupportedVersion(String),
    Repo(RepoError),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Parse(err) => write!(f, "document parse error: {}", err),
            ImportError::UnsupportedVersion(version) => {
                write!(f, "unsupported document version '{}'", version)
            }
            ImportError::Repo(err) => write!(f, "{}", err),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ImportError::Parse(err) => Some(err),
            ImportError::UnsupportedVersion(_) => None,
            ImportError::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        ImportError::Repo(value)
    }
}
