//! Storage abstraction for the catalog.
//!
//! The [`CatalogStore`] trait defines every query and mutation used by the
//! page composition and admin layers, enabling pluggable backends (SQLite
//! in production, in-memory for tests).
//!
//! Implementations must be `Send + Sync` to be shared across request
//! handlers.
//!
//! # Ordering contract
//!
//! - Tool lists: score (desc), then name (asc).
//! - A tool's categories and alternatives: name (asc).
//! - Alternative listings: published tool count (desc), then name (asc).
//! - Category listings: name (asc).
//!
//! # Integrity
//!
//! Slugs are unique per entity kind (`"slug already exists: <slug>"`), and
//! relation ids must refer to existing rows. Deleting a record removes its
//! join rows.

pub mod memory;

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{
    Alternative, AlternativeInput, AlternativePayload, AlternativeSummary, Category,
    CategoryInput, CategorySummary, Tool, ToolFilter, ToolInput, ToolPayload,
};

/// Aggregate counts for dashboards and `openalt stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    pub tools: i64,
    pub published_tools: i64,
    pub alternatives: i64,
    pub categories: i64,
}

/// Abstract catalog backend.
///
/// `now` parameters are Unix seconds and decide which tools count as
/// published.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_tools`](CatalogStore::list_tools) | Tools with relations, filtered |
/// | [`find_tool`](CatalogStore::find_tool) | Tool by slug |
/// | [`published_slugs`](CatalogStore::published_slugs) | Which search hits are still visible |
/// | [`find_alternative`](CatalogStore::find_alternative) | Alternative by slug with its published tools |
/// | [`list_alternatives`](CatalogStore::list_alternatives) | Alternatives with tool counts |
/// | [`list_categories`](CatalogStore::list_categories) | Categories with tool counts |
/// | `create_*` / `update_*` / `delete_*` | Admin mutations |
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_tools(&self, filter: &ToolFilter, now: i64) -> Result<Vec<ToolPayload>>;

    async fn find_tool(&self, slug: &str) -> Result<Option<ToolPayload>>;

    async fn find_tool_by_id(&self, id: &str) -> Result<Option<ToolPayload>>;

    /// The subset of `slugs` that name currently published tools.
    async fn published_slugs(&self, slugs: &[String], now: i64) -> Result<HashSet<String>>;

    async fn create_tool(&self, input: &ToolInput) -> Result<Tool>;

    /// Returns `None` when no tool has this id.
    async fn update_tool(&self, id: &str, input: &ToolInput) -> Result<Option<Tool>>;

    async fn delete_tool(&self, id: &str) -> Result<bool>;

    async fn list_alternatives(&self, now: i64) -> Result<Vec<AlternativeSummary>>;

    /// An alternative with its published tools in ranking order.
    async fn find_alternative(&self, slug: &str, now: i64) -> Result<Option<AlternativePayload>>;

    async fn find_alternative_by_id(&self, id: &str) -> Result<Option<Alternative>>;

    async fn create_alternative(&self, input: &AlternativeInput) -> Result<Alternative>;

    async fn update_alternative(
        &self,
        id: &str,
        input: &AlternativeInput,
    ) -> Result<Option<Alternative>>;

    async fn delete_alternative(&self, id: &str) -> Result<bool>;

    async fn list_categories(&self, now: i64) -> Result<Vec<CategorySummary>>;

    async fn find_category(&self, slug: &str) -> Result<Option<Category>>;

    async fn find_category_by_id(&self, id: &str) -> Result<Option<Category>>;

    async fn create_category(&self, input: &CategoryInput) -> Result<Category>;

    async fn update_category(&self, id: &str, input: &CategoryInput)
        -> Result<Option<Category>>;

    async fn delete_category(&self, id: &str) -> Result<bool>;

    async fn counts(&self, now: i64) -> Result<CatalogCounts>;
}

/// Sort tools by score (desc), then name (asc).
pub fn sort_tools(tools: &mut [ToolPayload]) {
    tools.sort_by(|a, b| {
        b.tool
            .score
            .cmp(&a.tool.score)
            .then_with(|| a.tool.name.cmp(&b.tool.name))
    });
}

/// Sort alternative summaries by tool count (desc), then name (asc).
pub fn sort_alternatives(alternatives: &mut [AlternativeSummary]) {
    alternatives.sort_by(|a, b| {
        b.tool_count
            .cmp(&a.tool_count)
            .then_with(|| a.alternative.name.cmp(&b.alternative.name))
    });
}
