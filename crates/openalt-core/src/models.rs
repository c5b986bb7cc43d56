//! Catalog data models.
//!
//! Plain records mirrored from the relational schema, plus the payload
//! shapes returned by [`CatalogStore`](crate::store::CatalogStore) queries
//! (records joined with their relations) and the inputs accepted by its
//! mutations.
//!
//! Timestamps are Unix seconds, ids are UUID v4 strings.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A cataloged open source product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub website: String,
    pub repository: Option<String>,
    /// Ranking weight; listings are ordered by it (desc).
    pub score: i64,
    pub stars: i64,
    pub published_at: Option<i64>,
    pub last_commit_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Tool {
    /// A tool is visible on public pages once its publish date has passed.
    pub fn is_published(&self, now: i64) -> bool {
        matches!(self.published_at, Some(ts) if ts <= now)
    }
}

/// A commercial/proprietary product that tools are suggested as substitutes for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub website: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A classification tag applied to tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Plural display label, e.g. "Analytics Tools".
    pub label: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Category {
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(&self.name)
    }
}

/// A tool with its categories and alternatives, both ordered by name.
#[derive(Debug, Clone, Serialize)]
pub struct ToolPayload {
    #[serde(flatten)]
    pub tool: Tool,
    pub categories: Vec<Category>,
    pub alternatives: Vec<Alternative>,
}

/// An alternative with its published tools, ordered by score.
#[derive(Debug, Clone, Serialize)]
pub struct AlternativePayload {
    #[serde(flatten)]
    pub alternative: Alternative,
    pub tools: Vec<ToolPayload>,
}

/// An alternative with the number of published tools linked to it.
#[derive(Debug, Clone, Serialize)]
pub struct AlternativeSummary {
    #[serde(flatten)]
    pub alternative: Alternative,
    pub tool_count: i64,
}

/// A category with the number of published tools tagged with it.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub tool_count: i64,
}

/// Which tools a listing query returns.
#[derive(Debug, Clone, Default)]
pub struct ToolFilter {
    /// Only tools whose publish date has passed.
    pub published_only: bool,
    /// Only tools tagged with this category slug.
    pub category: Option<String>,
    pub limit: Option<i64>,
}

impl ToolFilter {
    pub fn published() -> Self {
        Self {
            published_only: true,
            ..Default::default()
        }
    }
}

/// Fields accepted when creating or updating a tool.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToolInput {
    pub name: String,
    /// Derived from `name` when empty.
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub website: String,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub stars: i64,
    #[serde(default)]
    pub published_at: Option<i64>,
    #[serde(default)]
    pub last_commit_at: Option<i64>,
    #[serde(default)]
    pub category_ids: Vec<String>,
    #[serde(default)]
    pub alternative_ids: Vec<String>,
}

/// Fields accepted when creating or updating an alternative.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AlternativeInput {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    pub website: String,
}

/// Fields accepted when creating or updating a category.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl ToolInput {
    /// Trim fields, derive the slug, and reject inputs the store must not see.
    pub fn normalized(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        self.website = self.website.trim().to_string();
        self.slug = resolve_slug(&self.slug, &self.name)?;
        self.description = non_empty(self.description);
        self.repository = non_empty(self.repository);
        validate_url("website", &self.website)?;
        if let Some(ref repo) = self.repository {
            validate_url("repository", repo)?;
        }
        Ok(self)
    }
}

impl AlternativeInput {
    pub fn normalized(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        self.website = self.website.trim().to_string();
        self.slug = resolve_slug(&self.slug, &self.name)?;
        self.description = non_empty(self.description);
        validate_url("website", &self.website)?;
        Ok(self)
    }
}

impl CategoryInput {
    pub fn normalized(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        self.slug = resolve_slug(&self.slug, &self.name)?;
        self.label = non_empty(self.label);
        Ok(self)
    }
}

/// Turn a display name into a URL slug.
///
/// Lowercases ASCII alphanumerics and collapses every other run of
/// characters into a single `-`.
///
/// ```
/// use openalt_core::models::slugify;
///
/// assert_eq!(slugify("Visual Studio Code"), "visual-studio-code");
/// assert_eq!(slugify("C++ / Rust!"), "c-rust");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

fn resolve_slug(slug: &str, name: &str) -> Result<String> {
    if name.is_empty() {
        bail!(ValidationError::Empty { field: "name" });
    }
    let source = if slug.trim().is_empty() { name } else { slug };
    let slug = slugify(source);
    if slug.is_empty() {
        bail!(ValidationError::Slug(source.to_string()));
    }
    Ok(slug)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_url(field: &'static str, url: &str) -> Result<()> {
    if url.is_empty() {
        bail!(ValidationError::Empty { field });
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        bail!(ValidationError::Url {
            field,
            value: url.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  Hello,   World  "), "hello-world");
        assert_eq!(slugify("n8n"), "n8n");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("Café Olé"), "caf-ol");
    }

    #[test]
    fn test_tool_input_derives_slug() {
        let input = ToolInput {
            name: " Plausible Analytics ".into(),
            website: "https://plausible.io".into(),
            description: Some("   ".into()),
            ..Default::default()
        }
        .normalized()
        .unwrap();
        assert_eq!(input.name, "Plausible Analytics");
        assert_eq!(input.slug, "plausible-analytics");
        assert_eq!(input.description, None);
    }

    #[test]
    fn test_tool_input_explicit_slug_is_cleaned() {
        let input = ToolInput {
            name: "Cal.com".into(),
            slug: "Cal Com".into(),
            website: "https://cal.com".into(),
            ..Default::default()
        }
        .normalized()
        .unwrap();
        assert_eq!(input.slug, "cal-com");
    }

    #[test]
    fn test_tool_input_rejects_bad_website() {
        let err = ToolInput {
            name: "X".into(),
            website: "ftp://x".into(),
            ..Default::default()
        }
        .normalized()
        .unwrap_err();
        assert!(err.to_string().contains("invalid website"));
        assert!(ValidationError::is_validation(&err));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = CategoryInput::default().normalized().unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_is_published() {
        let mut tool = Tool {
            id: "t".into(),
            name: "T".into(),
            slug: "t".into(),
            description: None,
            website: "https://t.dev".into(),
            repository: None,
            score: 0,
            stars: 0,
            published_at: None,
            last_commit_at: None,
            created_at: 0,
            updated_at: 0,
        };
        assert!(!tool.is_published(100));
        tool.published_at = Some(50);
        assert!(tool.is_published(100));
        tool.published_at = Some(150);
        assert!(!tool.is_published(100));
    }

    #[test]
    fn test_category_label_fallback() {
        let mut cat = Category {
            id: "c".into(),
            name: "Analytics".into(),
            slug: "analytics".into(),
            label: None,
            created_at: 0,
            updated_at: 0,
        };
        assert_eq!(cat.display_label(), "Analytics");
        cat.label = Some("Analytics Tools".into());
        assert_eq!(cat.display_label(), "Analytics Tools");
    }
}
