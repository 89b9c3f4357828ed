use crate::domain::{Category, Prompt};

/// Case-insensitive substring filter over title, content, tags, and owning
/// category name. A category-name hit pulls in every prompt of that category.
/// Title matches rank before non-title matches; inside each tier the order is
/// lexicographic by title. Each prompt appears at most once regardless of how
/// many fields matched.
pub fn filter(prompts: &[Prompt], categories: &[Category], term: &str) -> Vec<Prompt> {
    let needle = term.trim().to_lowercase();

    let matching_category_ids: Vec<&str> = categories
        .iter()
        .filter(|category| category.name.to_lowercase().contains(&needle))
        .map(|category| category.id.as_str())
        .collect();

    let mut ranked: Vec<(u8, String, Prompt)> = Vec::new();
    for prompt in prompts {
        let tier = match_tier(prompt, &needle, &matching_category_ids);
        if let Some(tier) = tier {
            ranked.push((tier, prompt.title.to_lowercase(), prompt.clone()));
        }
    }

    ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    ranked.into_iter().map(|(_, _, prompt)| prompt).collect()
}

fn match_tier(prompt: &Prompt, needle: &str, matching_category_ids: &[&str]) -> Option<u8> {
    if prompt.title.to_lowercase().contains(needle) {
        return Some(0);
    }
    let content_hit = prompt.content.to_lowercase().contains(needle);
    let tag_hit = prompt
        .tag_list()
        .iter()
        .any(|tag| tag.to_lowercase().contains(needle));
    let category_hit = prompt
        .category_id
        .as_deref()
        .is_some_and(|cid| matching_category_ids.contains(&cid));
    if content_hit || tag_hit || category_hit {
        Some(1)
    } else {
        None
    }
}
