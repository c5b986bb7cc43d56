//! Derived display structures computed from tool lists.
//!
//! Pages never render raw query results directly; they slice and rank them
//! first. Everything here is pure and order-preserving so that the same
//! input always renders the same page.

use serde::Serialize;

use crate::models::{Category, ToolPayload};

/// Number of tools highlighted on an alternative page.
pub const TOP_TOOLS: usize = 5;

/// A category together with how many tools in a list carry it.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// Take at most `n` tools from the front of an already-ordered list.
pub fn top_tools(tools: &[ToolPayload], n: usize) -> &[ToolPayload] {
    &tools[..tools.len().min(n)]
}

/// Rank the categories used by `tools` by how many tools carry each one.
///
/// Sorted by descending count; ties keep the order in which a category was
/// first encountered while walking the tools (and each tool's categories)
/// front to back.
pub fn rank_categories(tools: &[ToolPayload]) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();

    for payload in tools {
        for category in &payload.categories {
            match counts.iter_mut().find(|c| c.category.id == category.id) {
                Some(entry) => entry.count += 1,
                None => counts.push(CategoryCount {
                    category: category.clone(),
                    count: 1,
                }),
            }
        }
    }

    // sort_by is stable: equal counts stay in encounter order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// The first `n` candidates other than the tool identified by `tool_slug`.
pub fn related_tools<'a>(
    candidates: &'a [ToolPayload],
    tool_slug: &str,
    n: usize,
) -> Vec<&'a ToolPayload> {
    candidates
        .iter()
        .filter(|p| p.tool.slug != tool_slug)
        .take(n)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tool;

    fn category(id: &str) -> Category {
        Category {
            id: id.to_string(),
            name: id.to_uppercase(),
            slug: id.to_string(),
            label: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn tool(slug: &str, cats: &[&str]) -> ToolPayload {
        ToolPayload {
            tool: Tool {
                id: format!("id-{}", slug),
                name: slug.to_string(),
                slug: slug.to_string(),
                description: None,
                website: format!("https://{}.dev", slug),
                repository: None,
                score: 0,
                stars: 0,
                published_at: Some(0),
                last_commit_at: None,
                created_at: 0,
                updated_at: 0,
            },
            categories: cats.iter().map(|c| category(c)).collect(),
            alternatives: Vec::new(),
        }
    }

    fn slugs(ranked: &[CategoryCount]) -> Vec<(&str, usize)> {
        ranked
            .iter()
            .map(|c| (c.category.slug.as_str(), c.count))
            .collect()
    }

    #[test]
    fn test_rank_by_descending_count() {
        let tools = vec![
            tool("a", &["crm"]),
            tool("b", &["analytics", "crm"]),
            tool("c", &["analytics", "crm"]),
            tool("d", &["email"]),
        ];
        let ranked = rank_categories(&tools);
        assert_eq!(
            slugs(&ranked),
            vec![("crm", 3), ("analytics", 2), ("email", 1)]
        );
    }

    #[test]
    fn test_rank_ties_keep_encounter_order() {
        let tools = vec![
            tool("a", &["zeta", "alpha"]),
            tool("b", &["mid"]),
            tool("c", &["mid", "alpha", "zeta"]),
        ];
        let ranked = rank_categories(&tools);
        // all three have count 2; zeta was seen first, then alpha, then mid
        assert_eq!(
            slugs(&ranked),
            vec![("zeta", 2), ("alpha", 2), ("mid", 2)]
        );
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank_categories(&[]).is_empty());
        assert!(rank_categories(&[tool("a", &[])]).is_empty());
    }

    #[test]
    fn test_top_tools_never_exceeds_limit() {
        let tools: Vec<ToolPayload> = (0..9).map(|i| tool(&format!("t{}", i), &[])).collect();
        for available in 0..tools.len() {
            let top = top_tools(&tools[..available], TOP_TOOLS);
            assert!(top.len() <= TOP_TOOLS);
            assert_eq!(top.len(), available.min(TOP_TOOLS));
        }
        let top = top_tools(&tools, TOP_TOOLS);
        assert_eq!(top.first().map(|p| p.tool.slug.as_str()), Some("t0"));
        assert_eq!(top.last().map(|p| p.tool.slug.as_str()), Some("t4"));
    }

    #[test]
    fn test_related_excludes_self() {
        let tools = vec![tool("a", &[]), tool("b", &[]), tool("c", &[]), tool("d", &[])];
        let related = related_tools(&tools, "b", 2);
        let names: Vec<&str> = related.iter().map(|p| p.tool.slug.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }
}
