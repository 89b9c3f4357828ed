use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Category, Prompt};
use crate::imports::{self, ExportDocument, ImportError, ImportSummary};
use crate::repo::{Fetched, PromptRepository, RepoError, RepoStats};
use crate::store::{self, StoreError};
use crate::sync::{RemoteSync, SyncError, SyncOutcome, SyncSettings};
use crate::tree::{TreeEngine, TreeNode, FILTER_DEBOUNCE};

const SETTINGS_FILE: &str = "promptdeck.toml";

/// Process-wide context, constructed once in `run()` and passed by reference.
/// Owns the store connection and the tree projection engine; every mutation
/// goes through here so the debounced data-changed signal always fires.
pub struct App {
    conn: Connection,
    engine: TreeEngine,
    settings_path: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct NewPromptInput {
    pub title: String,
    pub content: String,
    pub category_id: Option<String>,
    pub tags: Vec<String>,
    pub is_guide: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePromptPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub uncategorize: bool,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    pub guide: Option<bool>,
}

impl UpdatePromptPatch {
    fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.content.is_some()
            || self.category.is_some()
            || self.uncategorize
            || !self.add_tags.is_empty()
            || !self.remove_tags.is_empty()
            || self.guide.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategoryInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TreeBranch {
    pub node: TreeNode,
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TreeSnapshot {
    pub branches: Vec<TreeBranch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
}

impl App {
    pub fn open(db_path: &str) -> Result<Self, AppError> {
        ensure_parent_dir(db_path)?;
        let conn = store::open_connection(db_path)?;
        let settings_path = Path::new(db_path)
            .parent()
            .map(|dir| dir.join(SETTINGS_FILE))
            .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE));
        Ok(Self {
            conn,
            engine: TreeEngine::new(),
            settings_path,
        })
    }

    pub fn repo(&self) -> PromptRepository<'_> {
        PromptRepository::new(&self.conn)
    }

    pub fn engine_mut(&mut self) -> &mut TreeEngine {
        &mut self.engine
    }

    pub fn create_prompt(&mut self, input: NewPromptInput) -> Result<Prompt, AppError> {
        let repo = PromptRepository::new(&self.conn);
        if let Some(category_id) = input.category_id.as_deref() {
            if repo.category(category_id).is_none() {
                return Err(AppError::NotFound(format!("category '{category_id}'")));
            }
        }

        let prompt = Prompt {
            id: format!("P-{}", Uuid::now_v7()),
            title: input.title,
            content: input.content,
            category_id: input.category_id,
            tags: normalize_tags(input.tags),
            is_guide: input.is_guide,
            created_at: Some(store::now_utc_rfc3339()),
        };
        repo.save_prompt(prompt.clone())?;
        self.touch();
        Ok(prompt)
    }

    pub fn update_prompt(&mut self, id: &str, patch: UpdatePromptPatch) -> Result<Prompt, AppError> {
        if !patch.has_changes() {
            return Err(AppError::InvalidArgument(
                "no changes requested".to_string(),
            ));
        }
        let repo = PromptRepository::new(&self.conn);
        let mut prompt = repo
            .prompt(id)
            .ok_or_else(|| AppError::NotFound(format!("prompt '{id}'")))?;

        if let Some(title) = patch.title {
            prompt.title = title;
        }
        if let Some(content) = patch.content {
            prompt.content = content;
        }
        if patch.uncategorize {
            prompt.category_id = None;
        } else if let Some(category_id) = patch.category {
            if repo.category(&category_id).is_none() {
                return Err(AppError::NotFound(format!("category '{category_id}'")));
            }
            prompt.category_id = Some(category_id);
        }
        if let Some(guide) = patch.guide {
            prompt.is_guide = guide;
        }

        let mut tags = prompt.tags.take().unwrap_or_default();
        for tag in patch.add_tags {
            let tag = tag.trim().to_string();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags.retain(|tag| !patch.remove_tags.iter().any(|r| r.trim() == tag));
        prompt.tags = if tags.is_empty() { None } else { Some(tags) };

        repo.save_prompt(prompt.clone())?;
        self.touch();
        Ok(prompt)
    }

    /// Soft delete: the prompt moves to the uncategorized bucket.
    pub fn remove_prompt(&mut self, id: &str) -> Result<Prompt, AppError> {
        let repo = PromptRepository::new(&self.conn);
        let updated = repo.delete_prompt(id)?;
        self.touch();
        Ok(updated)
    }

    pub fn purge_prompt(&mut self, id: &str) -> Result<(), AppError> {
        let repo = PromptRepository::new(&self.conn);
        repo.delete_prompt_completely(id)?;
        self.touch();
        Ok(())
    }

    pub fn show_prompt(&self, id: &str) -> Option<Prompt> {
        self.repo().prompt(id)
    }

    pub fn list_categories(&self) -> Fetched<Vec<Category>> {
        self.repo().categories()
    }

    pub fn create_category(&mut self, input: CategoryInput) -> Result<Category, AppError> {
        let name = input
            .name
            .ok_or_else(|| AppError::InvalidArgument("category name is required".to_string()))?;
        let category = Category {
            id: format!("C-{}", Uuid::now_v7()),
            name,
            description: input.description,
            icon: input.icon,
            sort_order: input.sort_order,
            created_at: Some(store::now_utc_rfc3339()),
        };
        let repo = PromptRepository::new(&self.conn);
        repo.save_category(category.clone())?;
        self.touch();
        Ok(category)
    }

    pub fn update_category(&mut self, id: &str, input: CategoryInput) -> Result<Category, AppError> {
        let repo = PromptRepository::new(&self.conn);
        let mut category = repo
            .category(id)
            .ok_or_else(|| AppError::NotFound(format!("category '{id}'")))?;
        if let Some(name) = input.name {
            category.name = name;
        }
        if input.description.is_some() {
            category.description = input.description;
        }
        if input.icon.is_some() {
            category.icon = input.icon;
        }
        if input.sort_order.is_some() {
            category.sort_order = input.sort_order;
        }
        repo.update_category(category.clone())?;
        self.touch();
        Ok(category)
    }

    pub fn remove_category(&mut self, id: &str) -> Result<(), AppError> {
        let repo = PromptRepository::new(&self.conn);
        repo.delete_category(id)?;
        self.touch();
        Ok(())
    }

    /// Full projection in one pass: root items plus the children of every
    /// category root, for rendering and `--json`.
    pub fn tree_snapshot(&mut self) -> TreeSnapshot {
        let repo = PromptRepository::new(&self.conn);
        let degraded = repo.prompts().fault.or(repo.categories().fault);

        let roots = self.engine.root_items(&repo);
        let branches = roots
            .into_iter()
            .map(|node| {
                let children = self.engine.child_items(&repo, &node);
                TreeBranch { node, children }
            })
            .collect();
        TreeSnapshot { branches, degraded }
    }

    /// Runs a one-shot search through the engine's filter path, then clears
    /// the filter again so later projections are hierarchical.
    pub fn search(&mut self, term: &str) -> Vec<TreeNode> {
        let now = Instant::now();
        self.engine.set_search_filter(Some(term), now);
        self.engine.pump(now + FILTER_DEBOUNCE);

        let repo = PromptRepository::new(&self.conn);
        let results = self.engine.root_items(&repo);

        let later = now + FILTER_DEBOUNCE;
        self.engine.set_search_filter(None, later);
        self.engine.pump(later + FILTER_DEBOUNCE);
        results
    }

    pub fn stats(&self, top_n: usize) -> Fetched<RepoStats> {
        self.repo().stats(top_n)
    }

    pub fn export_document(&self) -> Result<ExportDocument, AppError> {
        Ok(imports::export(&self.repo())?)
    }

    pub fn export_to_file(&self, path: &Path) -> Result<ExportDocument, AppError> {
        let document = self.export_document()?;
        let json = serde_json::to_string_pretty(&document)
            .map_err(|err| AppError::InvalidArgument(err.to_string()))?;
        std::fs::write(path, json + "\n")?;
        Ok(document)
    }

    pub fn import_from_file(&mut self, path: &Path) -> Result<ImportSummary, AppError> {
        let raw = std::fs::read_to_string(path)?;
        let document = imports::parse_document(&raw)?;
        let repo = PromptRepository::new(&self.conn);
        let summary = imports::import(&repo, &document)?;
        self.touch();
        Ok(summary)
    }

    pub fn pull(&self) -> Result<SyncOutcome, AppError> {
        Ok(self.remote()?.pull())
    }

    pub fn push(&self) -> Result<SyncOutcome, AppError> {
        Ok(self.remote()?.push())
    }

    /// Clears both containers and reseeds the compiled-in defaults.
    pub fn reset(&mut self) -> Result<(), AppError> {
        let repo = PromptRepository::new(&self.conn);
        repo.clear_all()?;
        store::seed_defaults(&self.conn)?;
        self.touch();
        Ok(())
    }

    fn remote(&self) -> Result<RemoteSync, AppError> {
        let settings = SyncSettings::load(&self.settings_path)?;
        Ok(RemoteSync::new(settings))
    }

    fn touch(&mut self) {
        self.engine.request_refresh(Instant::now());
    }
}

fn ensure_parent_dir(path: &str) -> Result<(), AppError> {
    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn normalize_tags(tags: Vec<String>) -> Option<Vec<String>> {
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[derive(Debug)]
pub enum AppError {
    Io(std::io::Error),
    Store(StoreError),
    Repo(RepoError),
    Import(ImportError),
    Sync(SyncError),
    InvalidArgument(String),
    NotFound(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io(err) => write!(f, "I/O error: {}", err),
            AppError::Store(err) => write!(f, "{}", err),
            AppError::Repo(err) => write!(f, "{}", err),
            AppError::Import(err) => write!(f, "import error: {}", err),
            AppError::Sync(err) => write!(f, "{}", err),
            AppError::InvalidArgument(message) => write!(f, "{}", message),
            AppError::NotFound(what) => write!(f, "{} not found", what),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Io(err) => Some(err),
            AppError::Store(err) => Some(err),
            AppError::Repo(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Sync(err) => Some(err),
            AppError::InvalidArgument(_) => None,
            AppError::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        AppError::Io(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        AppError::Store(value)
    }
}

impl From<RepoError> for AppError {
    fn from(value: RepoError) -> Self {
        AppError::Repo(value)
    }
}

impl From<ImportError> for AppError {
    fn from(value: ImportError) -> Self {
        AppError::Import(value)
    }
}

impl From<SyncError> for AppError {
    fn from(value: SyncError) -> Self {
        AppError::Sync(value)
    }
}
