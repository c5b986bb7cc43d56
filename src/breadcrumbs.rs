//! Breadcrumb trails and their schema.org `BreadcrumbList` JSON-LD.

use maud::{html, Markup, PreEscaped};
use serde_json::json;

use crate::seo::absolute_url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub label: String,
    pub path: String,
}

/// A trail of links that always starts at Home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumbs {
    crumbs: Vec<Crumb>,
}

impl Default for Breadcrumbs {
    fn default() -> Self {
        Self::new()
    }
}

impl Breadcrumbs {
    pub fn new() -> Self {
        Self {
            crumbs: vec![Crumb {
                label: "Home".to_string(),
                path: "/".to_string(),
            }],
        }
    }

    pub fn push(mut self, label: impl Into<String>, path: impl Into<String>) -> Self {
        self.crumbs.push(Crumb {
            label: label.into(),
            path: path.into(),
        });
        self
    }

    pub fn crumbs(&self) -> &[Crumb] {
        &self.crumbs
    }

    /// JSON-LD payload, safe to embed inside a `<script>` element.
    pub fn json_ld(&self, base_url: &str) -> String {
        let items: Vec<serde_json::Value> = self
            .crumbs
            .iter()
            .enumerate()
            .map(|(i, c)| {
                json!({
                    "@type": "ListItem",
                    "position": i + 1,
                    "name": c.label,
                    "item": absolute_url(base_url, &c.path),
                })
            })
            .collect();

        json!({
            "@context": "https://schema.org",
            "@type": "BreadcrumbList",
            "itemListElement": items,
        })
        .to_string()
        .replace("</", "<\\/")
    }

    pub fn render(&self, base_url: &str) -> Markup {
        let last = self.crumbs.len().saturating_sub(1);
        html! {
            nav.breadcrumbs aria-label="Breadcrumb" {
                ol {
                    @for (i, crumb) in self.crumbs.iter().enumerate() {
                        li {
                            @if i == last {
                                span aria-current="page" { (crumb.label) }
                            } @else {
                                a href=(crumb.path) { (crumb.label) }
                            }
                        }
                    }
                }
            }
            script type="application/ld+json" { (PreEscaped(self.json_ld(base_url))) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_starts_at_home() {
        let trail = Breadcrumbs::new().push("Tools", "/").push("Gitea", "/tools/gitea");
        let labels: Vec<&str> = trail.crumbs().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Home", "Tools", "Gitea"]);
    }

    #[test]
    fn test_json_ld_positions_and_absolute_urls() {
        let trail = Breadcrumbs::new().push("Alternatives", "/alternatives");
        let value: serde_json::Value =
            serde_json::from_str(&trail.json_ld("https://openalt.dev")).unwrap();
        assert_eq!(value["@type"], "BreadcrumbList");
        let items = value["itemListElement"].as_array().unwrap();
        assert_eq!(items[0]["position"], 1);
        assert_eq!(items[0]["item"], "https://openalt.dev/");
        assert_eq!(items[1]["position"], 2);
        assert_eq!(items[1]["item"], "https://openalt.dev/alternatives");
    }

    #[test]
    fn test_json_ld_escapes_script_close() {
        let trail = Breadcrumbs::new().push("</script><b>", "/x");
        let ld = trail.json_ld("https://openalt.dev");
        assert!(!ld.contains("</script>"));
        assert!(ld.contains("<\\/script>"));
    }

    #[test]
    fn test_last_crumb_is_current_page() {
        let html = Breadcrumbs::new()
            .push("Categories", "/categories")
            .render("https://openalt.dev")
            .into_string();
        assert!(html.contains("<a href=\"/\">Home</a>"));
        assert!(html.contains("<span aria-current=\"page\">Categories</span>"));
    }
}
