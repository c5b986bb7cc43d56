//! Presentation components shared by public pages.

use maud::{html, Markup};

use openalt_core::models::{AlternativeSummary, Category, CategorySummary, ToolPayload};
use openalt_core::ranking::CategoryCount;
use openalt_core::search::SearchHit;

use crate::config::AdConfig;

pub fn badges(categories: &[Category]) -> Markup {
    html! {
        @if !categories.is_empty() {
            ul.badges {
                @for c in categories {
                    li { a.badge href={ "/categories/" (c.slug) } { (c.name) } }
                }
            }
        }
    }
}

pub fn tool_card(payload: &ToolPayload) -> Markup {
    let tool = &payload.tool;
    html! {
        article.card {
            h3 { a href={ "/tools/" (tool.slug) } { (tool.name) } }
            @if let Some(ref description) = tool.description {
                p { (description) }
            }
            (badges(&payload.categories))
            @if !payload.alternatives.is_empty() {
                p.muted {
                    "Alternative to "
                    @for (i, alt) in payload.alternatives.iter().enumerate() {
                        @if i > 0 { ", " }
                        a href={ "/alternatives/" (alt.slug) } { (alt.name) }
                    }
                }
            }
            @if tool.stars > 0 {
                span.muted { "★ " (tool.stars) }
            }
        }
    }
}

/// Grid of tool cards. `id="results"` is the search box's render target.
pub fn tool_list(tools: &[ToolPayload], empty: &str) -> Markup {
    html! {
        div class="grid" id="results" {
            @if tools.is_empty() {
                p.empty { (empty) }
            }
            @for payload in tools {
                (tool_card(payload))
            }
        }
    }
}

pub fn hit_card(hit: &SearchHit) -> Markup {
    html! {
        article.card {
            h3 { a href={ "/tools/" (hit.slug) } { (hit.name) } }
            @if let Some(ref description) = hit.description {
                p { (description) }
            }
        }
    }
}

pub fn hit_list(hits: &[SearchHit]) -> Markup {
    html! {
        div class="grid" id="results" {
            @if hits.is_empty() {
                p.empty { "No tools match your search." }
            }
            @for hit in hits {
                (hit_card(hit))
            }
        }
    }
}

pub fn alternative_card(summary: &AlternativeSummary) -> Markup {
    let alt = &summary.alternative;
    html! {
        article.card {
            h3 { a href={ "/alternatives/" (alt.slug) } { (alt.name) } }
            @if let Some(ref description) = alt.description {
                p { (description) }
            }
            p.muted { (count_label(summary.tool_count, "open source alternative")) }
        }
    }
}

pub fn category_card(summary: &CategorySummary) -> Markup {
    let cat = &summary.category;
    html! {
        article.card {
            h3 { a href={ "/categories/" (cat.slug) } { (cat.display_label()) } }
            p.muted { (count_label(summary.tool_count, "tool")) }
        }
    }
}

/// Categories ranked by tool count, as shown on alternative pages.
pub fn category_ranking(ranking: &[CategoryCount]) -> Markup {
    html! {
        @if !ranking.is_empty() {
            ol.ranking {
                @for entry in ranking {
                    li {
                        a href={ "/categories/" (entry.category.slug) } { (entry.category.display_label()) }
                        " "
                        span.muted { "(" (entry.count) ")" }
                    }
                }
            }
        }
    }
}

/// A sponsored placement; renders nothing without an ad.
pub fn ad_slot(ad: Option<&AdConfig>, slot: &str) -> Markup {
    html! {
        @if let Some(ad) = ad {
            aside.ad data-slot=(slot) {
                span.ad-label { "Sponsored" }
                p {
                    a href=(ad.website) rel="sponsored noopener" target="_blank" { strong { (ad.name) } }
                    " – " (ad.description)
                }
            }
        }
    }
}

pub fn count_label(count: i64, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openalt_core::models::{Alternative, Tool};

    fn payload() -> ToolPayload {
        ToolPayload {
            tool: Tool {
                id: "t1".into(),
                name: "Penpot".into(),
                slug: "penpot".into(),
                description: Some("Design <together>".into()),
                website: "https://penpot.app".into(),
                repository: None,
                score: 1,
                stars: 30000,
                published_at: Some(0),
                last_commit_at: None,
                created_at: 0,
                updated_at: 0,
            },
            categories: vec![Category {
                id: "c1".into(),
                name: "Design".into(),
                slug: "design".into(),
                label: None,
                created_at: 0,
                updated_at: 0,
            }],
            alternatives: vec![Alternative {
                id: "a1".into(),
                name: "Figma".into(),
                slug: "figma".into(),
                description: None,
                website: "https://figma.com".into(),
                created_at: 0,
                updated_at: 0,
            }],
        }
    }

    #[test]
    fn test_tool_card_links_and_escapes() {
        let html = tool_card(&payload()).into_string();
        assert!(html.contains("href=\"/tools/penpot\""));
        assert!(html.contains("Design &lt;together&gt;"));
        assert!(html.contains("href=\"/categories/design\""));
        assert!(html.contains("href=\"/alternatives/figma\""));
        assert!(html.contains("★ 30000"));
    }

    #[test]
    fn test_empty_list_message() {
        let html = tool_list(&[], "Nothing here.").into_string();
        assert!(html.contains("id=\"results\""));
        assert!(html.contains("Nothing here."));
    }

    #[test]
    fn test_ad_slot_empty_without_ad() {
        assert_eq!(ad_slot(None, "tool").into_string(), "");
        let ad = AdConfig {
            name: "Acme".into(),
            description: "Hosting".into(),
            website: "https://acme.dev".into(),
            slots: vec!["tool".into()],
        };
        let html = ad_slot(Some(&ad), "tool").into_string();
        assert!(html.contains("data-slot=\"tool\""));
        assert!(html.contains("rel=\"sponsored noopener\""));
    }

    #[test]
    fn test_count_label() {
        assert_eq!(count_label(1, "tool"), "1 tool");
        assert_eq!(count_label(0, "tool"), "0 tools");
    }
}
