use std::io::{self, IsTerminal};

use crate::app::TreeSnapshot;
use crate::domain::{Category, Prompt};
use crate::repo::RepoStats;
use crate::tree::TreeNode;

pub fn print_tree(snapshot: &TreeSnapshot) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Prompts"));
    if let Some(fault) = snapshot.degraded.as_deref() {
        println!(
            "{}",
            palette.warn(&format!("store read degraded: {fault}"))
        );
    }
    if snapshot.branches.is_empty() {
        println!("{}", palette.dim("no prompts yet"));
        return;
    }

    for branch in &snapshot.branches {
        println!("{}", palette.category(branch.node.label()));
        for child in &branch.children {
            println!("{}", format_leaf_row(child, &palette));
        }
    }
}

pub fn print_search_results(term: &str, nodes: &[TreeNode]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Search"));
    println!("{}", palette.dim(&format!("query: {term}")));
    if nodes.is_empty() {
        println!("{}", palette.dim("no prompts matched"));
        return;
    }
    for node in nodes {
        println!("{}", format_leaf_row(node, &palette));
    }
    println!("{}", palette.dim(&format!("{} prompt(s)", nodes.len())));
}

pub fn print_prompt_show(prompt: &Prompt) {
    let palette = Palette::auto();
    let mut heading = prompt.title.clone();
    if prompt.is_guide {
        heading.push(' ');
        heading.push_str(&palette.guide_marker());
    }
    println!("{}", palette.heading(&heading));
    println!("{}", palette.id(&prompt.id));
    if let Some(category_id) = prompt.category_id.as_deref() {
        println!("{}", palette.dim(&format!("category: {category_id}")));
    }
    if !prompt.tag_list().is_empty() {
        println!(
            "{}",
            palette.tags(&format!("#{}", prompt.tag_list().join(" #")))
        );
    }
    if let Some(created_at) = prompt.created_at.as_deref() {
        println!("{}", palette.dim(&format!("created: {created_at}")));
    }
    if !prompt.content.is_empty() {
        println!();
        println!("{}", prompt.content);
    }
}

pub fn print_categories(categories: &[Category]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Categories"));
    if categories.is_empty() {
        println!("{}", palette.dim("no categories"));
        return;
    }
    for category in categories {
        let mut line = format!("{} {}", palette.id(&category.id), category.name);
        if let Some(description) = category.description.as_deref() {
            line.push(' ');
            line.push_str(&palette.dim(description));
        }
        if let Some(sort_order) = category.sort_order {
            line.push(' ');
            line.push_str(&palette.dim(&format!("(sort {sort_order})")));
        }
        println!("{line}");
    }
}

pub fn print_stats(stats: &RepoStats, degraded: Option<&str>) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Stats"));
    if let Some(fault) = degraded {
        println!(
            "{}",
            palette.warn(&format!("store read degraded: {fault}"))
        );
    }
    println!(
        "prompts={} categories={} uncategorized={}",
        stats.prompt_count, stats.category_count, stats.uncategorized_count
    );
    for entry in &stats.top_categories {
        println!(
            "  {} {} {}",
            palette.id(&entry.id),
            entry.name,
            palette.dim(&format!("({})", entry.prompt_count))
        );
    }
}

fn format_leaf_row(node: &TreeNode, palette: &Palette) -> String {
    let mut line = format!(
        "  {} {} {}",
        palette.dim("↳"),
        palette.id(node.id()),
        node.label()
    );
    match node {
        TreeNode::Guide(_) => {
            line.push(' ');
            line.push_str(&palette.guide_marker());
        }
        TreeNode::Prompt(leaf) => {
            if !leaf.prompt.tag_list().is_empty() {
                line.push(' ');
                line.push_str(&palette.tags(&format!("#{}", leaf.prompt.tag_list().join(" #"))));
            }
        }
        TreeNode::Category(_) => {}
    }
    line
}

pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    pub fn category(&self, text: &str) -> String {
        self.paint("1;33", text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    pub fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    pub fn tags(&self, text: &str) -> String {
        self.paint("90", text)
    }

    pub fn warn(&self, text: &str) -> String {
        self.paint("33", text)
    }

    pub fn guide_marker(&self) -> String {
        self.paint("32", "[guide]")
    }
}

#[cfg(test)]
mod tests {
    use super::{format_leaf_row, Palette};
    use crate::domain::Prompt;
    use crate::tree::{PromptLeaf, TreeNode};

    fn plain_palette() -> Palette {
        Palette { enabled: false }
    }

    #[test]
    fn leaf_row_shows_id_label_and_tags() {
        let prompt = Prompt {
            id: "p1".to_string(),
            title: "Sort".to_string(),
            content: String::new(),
            category_id: None,
            tags: Some(vec!["code".to_string()]),
            is_guide: false,
            created_at: None,
        };
        let node = TreeNode::Prompt(PromptLeaf {
            id: prompt.id.clone(),
            label: prompt.title.clone(),
            parent_id: None,
            sort_order: None,
            prompt,
        });

        let row = format_leaf_row(&node, &plain_palette());
        assert_eq!(row, "  ↳ p1 Sort #code");
    }

    #[test]
    fn disabled_palette_passes_text_through() {
        let palette = plain_palette();
        assert_eq!(palette.heading("Prompts"), "Prompts");
    }
}
