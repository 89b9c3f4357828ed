use std::time::{Duration, Instant};

use serde::Serialize;

use crate::debounce::Debouncer;
use crate::domain::{Category, Prompt, UNCATEGORIZED_ID, UNCATEGORIZED_NAME};
use crate::notify::{ChangeNotifier, SubscriptionId};
use crate::repo::PromptRepository;
use crate::search;

/// Quiet period that coalesces bursts of mutation signals into one redraw.
pub const REFRESH_DEBOUNCE: Duration = Duration::from_millis(120);
/// Longer window for search input, so the projection is not recomputed on
/// every keystroke.
pub const FILTER_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Category(CategoryNode),
    Prompt(PromptLeaf),
    Guide(GuideLeaf),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryNode {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    pub category: Category,
    pub prompt_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PromptLeaf {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    pub prompt: Prompt,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GuideLeaf {
    pub id: String,
    pub label: String,
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
    pub prompt: Prompt,
    pub category_id: String,
}

impl TreeNode {
    pub fn id(&self) -> &str {
        match self {
            TreeNode::Category(node) => &node.id,
            TreeNode::Prompt(node) => &node.id,
            TreeNode::Guide(node) => &node.id,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TreeNode::Category(node) => &node.label,
            TreeNode::Prompt(node) => &node.label,
            TreeNode::Guide(node) => &node.label,
        }
    }

    pub fn parent_id(&self) -> Option<&str> {
        match self {
            TreeNode::Category(node) => node.parent_id.as_deref(),
            TreeNode::Prompt(node) => node.parent_id.as_deref(),
            TreeNode::Guide(node) => node.parent_id.as_deref(),
        }
    }
}

/// Derives the sidebar hierarchy from the flat repository state on demand.
/// Holds only transient projections: the repository keeps the canonical
/// records, this engine caches the last emitted nodes for parent lookups.
pub struct TreeEngine {
    last_computed: Vec<TreeNode>,
    search_filter: Option<String>,
    staged_filter: Option<Option<String>>,
    refresh: Debouncer,
    filter_debounce: Debouncer,
    notifier: ChangeNotifier,
}

impl Default for TreeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeEngine {
    pub fn new() -> Self {
        Self {
            last_computed: Vec::new(),
            search_filter: None,
            staged_filter: None,
            refresh: Debouncer::new(REFRESH_DEBOUNCE),
            filter_debounce: Debouncer::new(FILTER_DEBOUNCE),
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn subscribe(&mut self, callback: Box<dyn FnMut()>) -> SubscriptionId {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Signals that the underlying data changed. Trailing-edge debounced:
    /// bursts inside the window collapse into one notification, and each call
    /// pushes the deadline out again.
    pub fn request_refresh(&mut self, now: Instant) {
        self.refresh.trigger(now);
    }

    /// Stages a new search term. The change only takes effect once the filter
    /// window has been quiet and `pump` observes the deadline. `None` or a
    /// blank term clears filtering.
    pub fn set_search_filter(&mut self, term: Option<&str>, now: Instant) {
        self.staged_filter = Some(normalize_filter(term));
        self.filter_debounce.trigger(now);
    }

    pub fn active_filter(&self) -> Option<&str> {
        self.search_filter.as_deref()
    }

    /// Drives both debouncers. Fires at most one data-changed notification per
    /// call, no matter how many deadlines passed.
    pub fn pump(&mut self, now: Instant) -> bool {
        let mut notify = false;
        if self.filter_debounce.fire_if_due(now) {
            if let Some(staged) = self.staged_filter.take() {
                self.search_filter = staged;
            }
            notify = true;
        }
        if self.refresh.fire_if_due(now) {
            notify = true;
        }
        if notify {
            self.notifier.emit();
        }
        notify
    }

    /// Cancels pending deadlines; nothing fires after this.
    pub fn dispose(&mut self) {
        self.refresh.cancel();
        self.filter_debounce.cancel();
    }

    /// Root projection: the flat ranked search result while a filter is
    /// active, otherwise one category node per category (repository order)
    /// plus the uncategorized bucket when it would be non-empty.
    pub fn root_items(&mut self, repo: &PromptRepository) -> Vec<TreeNode> {
        let prompts = repo.prompts().value;
        let categories = repo.categories().value;

        let nodes = match self.search_filter.as_deref() {
            Some(term) => search::filter(&prompts, &categories, term)
                .into_iter()
                .map(flat_leaf)
                .collect(),
            None => hierarchy_roots(&prompts, &categories),
        };

        self.last_computed = nodes.clone();
        nodes
    }

    /// Children of a category node. Non-category nodes have none. The guide
    /// leaf, when present, is always first and never duplicated among the
    /// remaining prompts.
    pub fn child_items(&self, repo: &PromptRepository, parent: &TreeNode) -> Vec<TreeNode> {
        let TreeNode::Category(category_node) = parent else {
            return Vec::new();
        };

        let prompts = repo.prompts().value;
        if category_node.id == UNCATEGORIZED_ID {
            let categories = repo.categories().value;
            return uncategorized_of(&prompts, &categories)
                .into_iter()
                .map(|prompt| prompt_leaf(prompt, UNCATEGORIZED_ID))
                .collect();
        }

        let members: Vec<Prompt> = prompts
            .into_iter()
            .filter(|p| p.category_id.as_deref() == Some(category_node.id.as_str()))
            .collect();

        let guide_index = members.iter().position(|p| p.is_guide);
        let mut children = Vec::with_capacity(members.len());
        if let Some(index) = guide_index {
            let guide = &members[index];
            children.push(TreeNode::Guide(GuideLeaf {
                id: guide.id.clone(),
                label: guide.title.clone(),
                parent_id: Some(category_node.id.clone()),
                sort_order: None,
                prompt: guide.clone(),
                category_id: category_node.id.clone(),
            }));
        }
        for (index, prompt) in members.into_iter().enumerate() {
            if Some(index) == guide_index {
                continue;
            }
            children.push(prompt_leaf(prompt, &category_node.id));
        }
        children
    }

    /// Single-level lookup against the last computed root nodes. Deeper
    /// nesting does not exist in this model.
    pub fn parent_of(&self, node: &TreeNode) -> Option<&TreeNode> {
        let parent_id = node.parent_id()?;
        self.last_computed
            .iter()
            .find(|candidate| matches!(candidate, TreeNode::Category(_)) && candidate.id() == parent_id)
    }
}

fn normalize_filter(term: Option<&str>) -> Option<String> {
    let trimmed = term?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn hierarchy_roots(prompts: &[Prompt], categories: &[Category]) -> Vec<TreeNode> {
    let mut nodes: Vec<TreeNode> = categories
        .iter()
        .map(|category| {
            let count = prompts
                .iter()
                .filter(|p| p.category_id.as_deref() == Some(category.id.as_str()))
                .count();
            TreeNode::Category(CategoryNode {
                id: category.id.clone(),
                label: format!("{} ({})", category.name, count),
                parent_id: None,
                sort_order: category.sort_order,
                category: category.clone(),
                prompt_count: count,
            })
        })
        .collect();

    let loose = uncategorized_of(prompts, categories);
    if !loose.is_empty() {
        let bucket = Category::uncategorized();
        nodes.push(TreeNode::Category(CategoryNode {
            id: bucket.id.clone(),
            label: format!("{} ({})", UNCATEGORIZED_NAME, loose.len()),
            parent_id: None,
            sort_order: bucket.sort_order,
            prompt_count: loose.len(),
            category: bucket,
        }));
    }
    nodes
}

/// Prompts whose category reference is absent or does not resolve to any
/// existing category.
fn uncategorized_of(prompts: &[Prompt], categories: &[Category]) -> Vec<Prompt> {
    prompts
        .iter()
        .filter(|p| {
            p.category_id
                .as_deref()
                .map_or(true, |cid| !categories.iter().any(|c| c.id == cid))
        })
        .cloned()
        .collect()
}

fn prompt_leaf(prompt: Prompt, parent_id: &str) -> TreeNode {
    TreeNode::Prompt(PromptLeaf {
        id: prompt.id.clone(),
        label: prompt.title.clone(),
        parent_id: Some(parent_id.to_string()),
        sort_order: None,
        prompt,
    })
}

fn flat_leaf(prompt: Prompt) -> TreeNode {
    TreeNode::Prompt(PromptLeaf {
        id: prompt.id.clone(),
        label: prompt.title.clone(),
        parent_id: None,
        sort_order: None,
        prompt,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use rusqlite::Connection;

    use super::{TreeEngine, TreeNode, FILTER_DEBOUNCE, REFRESH_DEBOUNCE};
    use crate::domain::{Category, Prompt, UNCATEGORIZED_ID};
    use crate::repo::PromptRepository;
    use crate::store;

    fn empty_conn() -> Connection {
        let conn = store::open_connection(":memory:").expect("in-memory store should open");
        PromptRepository::new(&conn)
            .clear_all()
            .expect("clear should work");
        conn
    }

    fn save_category(repo: &PromptRepository, id: &str, name: &str) {
        repo.save_category(Category {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            icon: None,
            sort_order: None,
            created_at: None,
        })
        .expect("category save should work");
    }

    fn save_prompt(repo: &PromptRepository, id: &str, title: &str, category: Option<&str>) {
        save_prompt_full(repo, id, title, category, false);
    }

    fn save_prompt_full(
        repo: &PromptRepository,
        id: &str,
        title: &str,
        category: Option<&str>,
        is_guide: bool,
    ) {
        repo.save_prompt(Prompt {
            id: id.to_string(),
            title: title.to_string(),
            content: String::new(),
            category_id: category.map(|c| c.to_string()),
            tags: None,
            is_guide,
            created_at: None,
        })
        .expect("prompt save should work");
    }

    fn labels(nodes: &[TreeNode]) -> Vec<&str> {
        nodes.iter().map(TreeNode::label).collect()
    }

    #[test]
    fn roots_follow_the_seeded_scenario() {
        let conn = empty_conn();
        let repo = PromptRepository::new(&conn);
        save_category(&repo, "programming", "编程");
        save_prompt(&repo, "p1", "Sort", Some("programming"));
        save_prompt(&repo, "p2", "Loose", None);

        let mut engine = TreeEngine::new();
        let roots = engine.root_items(&repo);
        assert_eq!(labels(&roots), vec!["编程 (1)", "未分类 (1)"]);

        let children = engine.child_items(&repo, &roots[0]);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id(), "p1");
        assert!(matches!(children[0], TreeNode::Prompt(_)));
    }

    #[test]
    fn no_uncategorized_node_when_every_prompt_resolves() {
        let conn = empty_conn();
        let repo = PromptRepository::new(&conn);
        save_category(&repo, "programming", "编程");
        save_prompt(&repo, "p1", "Sort", Some("programming"));

        let mut engine = TreeEngine::new();
        let roots = engine.root_items(&repo);
        assert_eq!(labels(&roots), vec!["编程 (1)"]);
    }

    #[test]
    fn dangling_category_reference_counts_as_uncategorized() {
        let conn = empty_conn();
        let repo = PromptRepository::new(&conn);
        save_prompt(&repo, "p1", "Orphan", Some("deleted-category"));

        let mut engine = TreeEngine::new();
        let roots = engine.root_items(&repo);
        assert_eq!(labels(&roots), vec!["未分类 (1)"]);

        let children = engine.child_items(&repo, &roots[0]);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].parent_id(), Some(UNCATEGORIZED_ID));
    }

    #[test]
    fn category_delete_moves_prompts_into_the_bucket() {
        let conn = empty_conn();
        let repo = PromptRepository::new(&conn);
        save_category(&repo, "programming", "编程");
        save_prompt(&repo, "p1", "Sort", Some("programming"));
        save_prompt(&repo, "p2", "Loose", None);

        repo.delete_category("programming").expect("delete works");

        let mut engine = TreeEngine::new();
        let roots = engine.root_items(&repo);
        assert_eq!(labels(&roots), vec!["未分类 (2)"]);
        assert!(repo
            .prompts()
            .value
            .iter()
            .all(|p| p.category_id.is_none()));
    }

    #[test]
    fn guide_leaf_is_first_and_never_duplicated() {
        let conn = empty_conn();
        let repo = PromptRepository::new(&conn);
        save_category(&repo, "programming", "编程");
        save_prompt(&repo, "p1", "Sort", Some("programming"));
        save_prompt_full(&repo, "programming.guide", "【指南】说明", Some("programming"), true);
        save_prompt(&repo, "p2", "Loop", Some("programming"));

        let mut engine = TreeEngine::new();
        let roots = engine.root_items(&repo);
        let children = engine.child_items(&repo, &roots[0]);

        assert!(matches!(children[0], TreeNode::Guide(_)));
        assert_eq!(children[0].id(), "programming.guide");
        let guide_occurrences = children
            .iter()
            .filter(|node| node.id() == "programming.guide")
            .count();
        assert_eq!(guide_occurrences, 1);
        assert_eq!(children.len(), 3);
        assert_eq!(children[1].id(), "p1");
        assert_eq!(children[2].id(), "p2");
    }

    #[test]
    fn legacy_convention_guide_is_detected_without_the_flag() {
        let conn = empty_conn();
        let repo = PromptRepository::new(&conn);
        save_category(&repo, "writing", "写作");
        // Stored without is_guide; the id suffix convention carries it.
        store::set_container(
            &conn,
            store::PROMPTS_KEY,
            r#"[{"id":"writing.guide","title":"old","category_id":"writing"},
                {"id":"p1","title":"Polish","category_id":"writing"}]"#,
        )
        .expect("container write should work");

        let mut engine = TreeEngine::new();
        let roots = engine.root_items(&repo);
        let children = engine.child_items(&repo, &roots[0]);
        assert!(matches!(children[0], TreeNode::Guide(_)));
    }

    #[test]
    fn prompt_leaves_have_no_children() {
        let conn = empty_conn();
        let repo = PromptRepository::new(&conn);
        save_category(&repo, "programming", "编程");
        save_prompt(&repo, "p1", "Sort", Some("programming"));

        let mut engine = TreeEngine::new();
        let roots = engine.root_items(&repo);
        let children = engine.child_items(&repo, &roots[0]);
        assert!(engine.child_items(&repo, &children[0]).is_empty());
    }

    #[test]
    fn parent_resolves_against_cached_roots() {
        let conn = empty_conn();
        let repo = PromptRepository::new(&conn);
        save_category(&repo, "programming", "编程");
        save_prompt(&repo, "p1", "Sort", Some("programming"));

        let mut engine = TreeEngine::new();
        let roots = engine.root_items(&repo);
        let children = engine.child_items(&repo, &roots[0]);

        let parent = engine.parent_of(&children[0]).expect("parent should resolve");
        assert_eq!(parent.id(), "programming");
        assert!(engine.parent_of(&roots[0]).is_none());
    }

    #[test]
    fn active_filter_bypasses_the_hierarchy() {
        let conn = empty_conn();
        let repo = PromptRepository::new(&conn);
        save_category(&repo, "programming", "编程");
        save_prompt(&repo, "p1", "Refactor helper", Some("programming"));
        save_prompt(&repo, "p2", "Loose", None);

        let mut engine = TreeEngine::new();
        let start = Instant::now();
        engine.set_search_filter(Some("refactor"), start);
        assert!(engine.pump(start + FILTER_DEBOUNCE));

        let results = engine.root_items(&repo);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id(), "p1");
        assert!(results[0].parent_id().is_none());
    }

    #[test]
    fn clearing_the_filter_restores_the_hierarchy() {
        let conn = empty_conn();
        let repo = PromptRepository::new(&conn);
        save_category(&repo, "programming", "编程");
        save_prompt(&repo, "p1", "Sort", Some("programming"));
        save_prompt(&repo, "p2", "Loose", None);

        let mut engine = TreeEngine::new();
        let pristine = engine.root_items(&repo);

        let start = Instant::now();
        engine.set_search_filter(Some("sort"), start);
        engine.pump(start + FILTER_DEBOUNCE);
        engine.root_items(&repo);

        engine.set_search_filter(None, start + Duration::from_secs(1));
        engine.pump(start + Duration::from_secs(1) + FILTER_DEBOUNCE);

        assert_eq!(engine.root_items(&repo), pristine);
    }

    #[test]
    fn blank_filter_means_no_filtering() {
        let conn = empty_conn();
        let repo = PromptRepository::new(&conn);
        save_category(&repo, "programming", "编程");
        save_prompt(&repo, "p1", "Sort", Some("programming"));

        let mut engine = TreeEngine::new();
        let start = Instant::now();
        engine.set_search_filter(Some("   "), start);
        engine.pump(start + FILTER_DEBOUNCE);

        assert!(engine.active_filter().is_none());
        assert_eq!(labels(&engine.root_items(&repo)), vec!["编程 (1)"]);
    }

    #[test]
    fn refresh_burst_notifies_once() {
        let mut engine = TreeEngine::new();
        let notifications = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&notifications);
        engine.subscribe(Box::new(move || counter.set(counter.get() + 1)));

        let start = Instant::now();
        for offset_ms in [0u64, 10, 20, 30] {
            engine.request_refresh(start + Duration::from_millis(offset_ms));
            engine.pump(start + Duration::from_millis(offset_ms));
        }
        engine.pump(start + Duration::from_millis(30) + REFRESH_DEBOUNCE);

        assert_eq!(notifications.get(), 1);
    }

    #[test]
    fn spaced_refreshes_notify_each_time() {
        let mut engine = TreeEngine::new();
        let notifications = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&notifications);
        engine.subscribe(Box::new(move || counter.set(counter.get() + 1)));

        let start = Instant::now();
        for round in 0..3u64 {
            let at = start + Duration::from_secs(round);
            engine.request_refresh(at);
            engine.pump(at + REFRESH_DEBOUNCE);
        }

        assert_eq!(notifications.get(), 3);
    }

    #[test]
    fn simultaneous_deadlines_notify_once() {
        let mut engine = TreeEngine::new();
        let notifications = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&notifications);
        engine.subscribe(Box::new(move || counter.set(counter.get() + 1)));

        let start = Instant::now();
        engine.request_refresh(start);
        engine.set_search_filter(Some("x"), start);
        engine.pump(start + FILTER_DEBOUNCE + REFRESH_DEBOUNCE);

        assert_eq!(notifications.get(), 1);
    }

    #[test]
    fn dispose_cancels_pending_notifications() {
        let mut engine = TreeEngine::new();
        let notifications = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&notifications);
        engine.subscribe(Box::new(move || counter.set(counter.get() + 1)));

        engine.request_refresh(Instant::now());
        engine.dispose();
        engine.pump(Instant::now() + Duration::from_secs(10));

        assert_eq!(notifications.get(), 0);
    }

    #[test]
    fn unsubscribed_observer_stops_receiving() {
        let mut engine = TreeEngine::new();
        let notifications = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&notifications);
        let id = engine.subscribe(Box::new(move || counter.set(counter.get() + 1)));
        assert!(engine.unsubscribe(id));

        let start = Instant::now();
        engine.request_refresh(start);
        engine.pump(start + REFRESH_DEBOUNCE);

        assert_eq!(notifications.get(), 0);
    }
}
