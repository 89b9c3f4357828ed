use std::error::Error;
use std::fmt;

use rusqlite::Connection;
use serde::Serialize;
use tracing::warn;

use crate::domain::{Category, Prompt};
use crate::store::{self, CATEGORIES_KEY, PROMPTS_KEY};

/// Typed accessors over the two record containers. Every write is a
/// read-modify-write of the whole collection; the lost-update window this
/// opens across concurrent processes is documented in DESIGN.md.
pub struct PromptRepository<'a> {
    conn: &'a Connection,
}

/// Read result that never fails: `value` is empty when the underlying store
/// read failed, and `fault` says so, so callers can tell "no data" apart from
/// "read failed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<T> {
    pub value: T,
    pub fault: Option<String>,
}

impl<T> Fetched<T> {
    fn ok(value: T) -> Self {
        Self { value, fault: None }
    }

    fn degraded(value: T, fault: String) -> Self {
        Self {
            value,
            fault: Some(fault),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.fault.is_some()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryPromptCount {
    pub id: String,
    pub name: String,
    pub prompt_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RepoStats {
    pub prompt_count: usize,
    pub category_count: usize,
    pub uncategorized_count: usize,
    pub top_categories: Vec<CategoryPromptCount>,
}

impl<'a> PromptRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn prompts(&self) -> Fetched<Vec<Prompt>> {
        match self.try_prompts() {
            Ok(list) => Fetched::ok(list),
            Err(err) => {
                warn!(error = %err, "prompt container read failed; returning empty set");
                Fetched::degraded(Vec::new(), err.to_string())
            }
        }
    }

    pub fn try_prompts(&self) -> Result<Vec<Prompt>, RepoError> {
        let raw = store::get_container(self.conn, PROMPTS_KEY)
            .map_err(|err| RepoError::StoreRead(err.to_string()))?;
        let mut prompts: Vec<Prompt> = match raw {
            Some(json) => serde_json::from_str(&json)
                .map_err(|err| RepoError::StoreRead(err.to_string()))?,
            None => Vec::new(),
        };
        for prompt in &mut prompts {
            prompt.normalize_guide_flag();
        }
        Ok(prompts)
    }

    pub fn prompt(&self, id: &str) -> Option<Prompt> {
        self.prompts().value.into_iter().find(|p| p.id == id)
    }

    pub fn save_prompt(&self, prompt: Prompt) -> Result<(), RepoError> {
        if prompt.id.trim().is_empty() {
            return Err(RepoError::Validation("prompt id cannot be empty".into()));
        }
        if prompt.title.trim().is_empty() {
            return Err(RepoError::Validation("prompt title cannot be empty".into()));
        }
        let mut all = self.try_prompts()?;
        match all.iter_mut().find(|p| p.id == prompt.id) {
            Some(slot) => *slot = prompt,
            None => all.push(prompt),
        }
        self.store_prompts(&all)
    }

    /// Soft delete: the record stays, its category link is cleared, so the
    /// prompt reappears in the uncategorized bucket.
    pub fn delete_prompt(&self, id: &str) -> Result<Prompt, RepoError> {
        let mut all = self.try_prompts()?;
        let slot = all
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        slot.category_id = None;
        let updated = slot.clone();
        self.store_prompts(&all)?;
        Ok(updated)
    }

    pub fn delete_prompt_completely(&self, id: &str) -> Result<(), RepoError> {
        let mut all = self.try_prompts()?;
        let before = all.len();
        all.retain(|p| p.id != id);
        if all.len() == before {
            return Err(RepoError::NotFound(id.to_string()));
        }
        self.store_prompts(&all)
    }

    pub fn categories(&self) -> Fetched<Vec<Category>> {
        match self.try_categories() {
            Ok(list) => Fetched::ok(list),
            Err(err) => {
                warn!(error = %err, "category container read failed; returning empty set");
                Fetched::degraded(Vec::new(), err.to_string())
            }
        }
    }

    pub fn try_categories(&self) -> Result<Vec<Category>, RepoError> {
        let raw = store::get_container(self.conn, CATEGORIES_KEY)
            .map_err(|err| RepoError::StoreRead(err.to_string()))?;
        match raw {
            Some(json) => {
                serde_json::from_str(&json).map_err(|err| RepoError::StoreRead(err.to_string()))
            }
            None => Ok(Vec::new()),
        }
    }

    pub fn category(&self, id: &str) -> Option<Category> {
        self.categories().value.into_iter().find(|c| c.id == id)
    }

    pub fn save_category(&self, category: Category) -> Result<(), RepoError> {
        if category.id.trim().is_empty() {
            return Err(RepoError::Validation("category id cannot be empty".into()));
        }
        if category.name.trim().is_empty() {
            return Err(RepoError::Validation(
                "category name cannot be empty".into(),
            ));
        }
        let mut all = self.try_categories()?;
        match all.iter_mut().find(|c| c.id == category.id) {
            Some(slot) => *slot = category,
            None => all.push(category),
        }
        self.store_categories(&all)
    }

    /// Full-record replace that, unlike `save_category`, refuses to create.
    pub fn update_category(&self, category: Category) -> Result<(), RepoError> {
        let mut all = self.try_categories()?;
        let slot = all
            .iter_mut()
            .find(|c| c.id == category.id)
            .ok_or_else(|| RepoError::NotFound(category.id.clone()))?;
        *slot = category;
        self.store_categories(&all)
    }

    /// Removes the category after clearing `category_id` on every prompt that
    /// references it. No orphaned references remain once this returns.
    pub fn delete_category(&self, id: &str) -> Result<(), RepoError> {
        let mut categories = self.try_categories()?;
        let before = categories.len();
        categories.retain(|c| c.id != id);
        if categories.len() == before {
            return Err(RepoError::NotFound(id.to_string()));
        }

        let mut prompts = self.try_prompts()?;
        let mut touched = false;
        for prompt in &mut prompts {
            if prompt.category_id.as_deref() == Some(id) {
                prompt.category_id = None;
                touched = true;
            }
        }
        if touched {
            self.store_prompts(&prompts)?;
        }
        self.store_categories(&categories)
    }

    /// Resets both containers to empty. Irreversible; no backup is taken.
    pub fn clear_all(&self) -> Result<(), RepoError> {
        store::clear_containers(self.conn).map_err(|err| RepoError::StoreWrite(err.to_string()))
    }

    pub fn stats(&self, top_n: usize) -> Fetched<RepoStats> {
        let prompts = self.prompts();
        let categories = self.categories();

        let mut top: Vec<CategoryPromptCount> = categories
            .value
            .iter()
            .map(|category| CategoryPromptCount {
                id: category.id.clone(),
                name: category.name.clone(),
                prompt_count: prompts
                    .value
                    .iter()
                    .filter(|p| p.category_id.as_deref() == Some(category.id.as_str()))
                    .count(),
            })
            .collect();
        // Stable sort keeps iteration order on ties.
        top.sort_by(|a, b| b.prompt_count.cmp(&a.prompt_count));
        top.truncate(top_n);

        let uncategorized_count = prompts
            .value
            .iter()
            .filter(|p| {
                p.category_id
                    .as_deref()
                    .map_or(true, |cid| !categories.value.iter().any(|c| c.id == cid))
            })
            .count();

        let stats = RepoStats {
            prompt_count: prompts.value.len(),
            category_count: categories.value.len(),
            uncategorized_count,
            top_categories: top,
        };
        match prompts.fault.or(categories.fault) {
            Some(fault) => Fetched::degraded(stats, fault),
            None => Fetched::ok(stats),
        }
    }

    fn store_prompts(&self, prompts: &[Prompt]) -> Result<(), RepoError> {
        let json =
            serde_json::to_string(prompts).map_err(|err| RepoError::StoreWrite(err.to_string()))?;
        store::set_container(self.conn, PROMPTS_KEY, &json)
            .map_err(|err| RepoError::StoreWrite(err.to_string()))
    }

    fn store_categories(&self, categories: &[Category]) -> Result<(), RepoError> {
        let json = serde_json::to_string(categories)
            .map_err(|err| RepoError::StoreWrite(err.to_string()))?;
        store::set_container(self.conn, CATEGORIES_KEY, &json)
            .map_err(|err| RepoError::StoreWrite(err.to_string()))
    }
}

#[derive(Debug)]
pub enum RepoError {
    NotFound(String),
    StoreRead(String),
    StoreWrite(String),
    Validation(String),
}

impl fmt::Display for RepoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoError::NotFound(id) => write!(f, "record '{}' not found", id),
            RepoError::StoreRead(detail) => write!(f, "store read failed: {}", detail),
            RepoError::StoreWrite(detail) => write!(f, "store write failed: {}", detail),
            RepoError::Validation(detail) => write!(f, "{}", detail),
        }
    }
}

impl Error for RepoError {}
