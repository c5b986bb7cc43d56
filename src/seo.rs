//! Per-page SEO metadata.
//!
//! Every page builds a [`PageMeta`] and the layout renders it into the
//! document head: `<title>`, meta description, canonical link, OpenGraph
//! and Twitter card tags.

use maud::{html, Markup};

use crate::config::SiteConfig;

/// Maximum length of a meta description, in characters.
pub const DESCRIPTION_LIMIT: usize = 160;

#[derive(Debug, Clone, Default)]
pub struct PageMeta {
    /// Page title without the site name; empty on the home page.
    pub title: String,
    /// Falls back to the site description.
    pub description: Option<String>,
    /// Absolute path of the page, e.g. `/tools/gitea`.
    pub path: String,
}

impl PageMeta {
    pub fn new(title: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            path: path.into(),
        }
    }

    pub fn with_description(mut self, description: Option<&str>) -> Self {
        self.description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self
    }

    /// `"{title} – {site}"`, or `"{site} – {tagline}"` for an empty title.
    pub fn full_title(&self, site: &SiteConfig) -> String {
        if self.title.trim().is_empty() {
            format!("{} – {}", site.name, site.tagline)
        } else {
            format!("{} – {}", self.title.trim(), site.name)
        }
    }

    pub fn meta_description(&self, site: &SiteConfig) -> String {
        truncate_description(
            self.description.as_deref().unwrap_or(&site.description),
            DESCRIPTION_LIMIT,
        )
    }

    pub fn canonical_url(&self, site: &SiteConfig) -> String {
        absolute_url(&site.url, &self.path)
    }

    /// Head tags for this page.
    pub fn render(&self, site: &SiteConfig) -> Markup {
        let title = self.full_title(site);
        let description = self.meta_description(site);
        let canonical = self.canonical_url(site);

        html! {
            title { (title) }
            meta name="description" content=(description);
            link rel="canonical" href=(canonical);
            meta property="og:type" content="website";
            meta property="og:site_name" content=(site.name);
            meta property="og:title" content=(title);
            meta property="og:description" content=(description);
            meta property="og:url" content=(canonical);
            meta name="twitter:card" content="summary";
            meta name="twitter:title" content=(title);
            meta name="twitter:description" content=(description);
        }
    }
}

/// Join the site base URL and an absolute path.
pub fn absolute_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() || path == "/" {
        format!("{}/", base)
    } else if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Collapse whitespace and cut `text` to at most `limit` characters at a
/// word boundary, appending `…` when shortened.
pub fn truncate_description(text: &str, limit: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= limit {
        return collapsed;
    }

    let head: String = collapsed.chars().take(limit.saturating_sub(1)).collect();
    let cut = match head.rfind(' ') {
        Some(pos) if pos > 0 => &head[..pos],
        _ => head.as_str(),
    };
    let cut = cut.trim_end_matches(|c: char| c == ',' || c == ';' || c == ':' || c == ' ');
    format!("{}…", cut)
}
