//! In-memory [`CatalogStore`] implementation for tests.
//!
//! Keeps every table in a `Vec` behind a single `std::sync::RwLock` and
//! enforces the same integrity rules as the SQLite schema.

use std::collections::HashSet;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::models::{
    Alternative, AlternativeInput, AlternativePayload, AlternativeSummary, Category,
    CategoryInput, CategorySummary, Tool, ToolFilter, ToolInput, ToolPayload,
};

use super::{sort_alternatives, sort_tools, CatalogCounts, CatalogStore};

#[derive(Default)]
struct Tables {
    tools: Vec<Tool>,
    alternatives: Vec<Alternative>,
    categories: Vec<Category>,
    /// (tool_id, category_id)
    tool_categories: Vec<(String, String)>,
    /// (tool_id, alternative_id)
    tool_alternatives: Vec<(String, String)>,
}

impl Tables {
    fn payload(&self, tool: &Tool) -> ToolPayload {
        let mut categories: Vec<Category> = self
            .tool_categories
            .iter()
            .filter(|(t, _)| *t == tool.id)
            .filter_map(|(_, c)| self.categories.iter().find(|cat| cat.id == *c))
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));

        let mut alternatives: Vec<Alternative> = self
            .tool_alternatives
            .iter()
            .filter(|(t, _)| *t == tool.id)
            .filter_map(|(_, a)| self.alternatives.iter().find(|alt| alt.id == *a))
            .cloned()
            .collect();
        alternatives.sort_by(|a, b| a.name.cmp(&b.name));

        ToolPayload {
            tool: tool.clone(),
            categories,
            alternatives,
        }
    }

    fn published_tool_ids(&self, now: i64) -> HashSet<&str> {
        self.tools
            .iter()
            .filter(|t| t.is_published(now))
            .map(|t| t.id.as_str())
            .collect()
    }

    fn check_tool_relations(&self, input: &ToolInput) -> Result<()> {
        for id in &input.category_ids {
            if !self.categories.iter().any(|c| c.id == *id) {
                bail!(ValidationError::UnknownCategory(id.clone()));
            }
        }
        for id in &input.alternative_ids {
            if !self.alternatives.iter().any(|a| a.id == *id) {
                bail!(ValidationError::UnknownAlternative(id.clone()));
            }
        }
        Ok(())
    }

    fn link_tool(&mut self, tool_id: &str, input: &ToolInput) {
        self.tool_categories.retain(|(t, _)| t != tool_id);
        self.tool_alternatives.retain(|(t, _)| t != tool_id);
        for id in dedup(&input.category_ids) {
            self.tool_categories.push((tool_id.to_string(), id));
        }
        for id in dedup(&input.alternative_ids) {
            self.tool_alternatives.push((tool_id.to_string(), id));
        }
    }
}

fn dedup(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

/// In-memory catalog store.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| anyhow!("store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| anyhow!("store lock poisoned"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn list_tools(&self, filter: &ToolFilter, now: i64) -> Result<Vec<ToolPayload>> {
        let tables = self.read()?;

        let mut tools: Vec<ToolPayload> = tables
            .tools
            .iter()
            .filter(|t| !filter.published_only || t.is_published(now))
            .map(|t| tables.payload(t))
            .filter(|p| match &filter.category {
                Some(slug) => p.categories.iter().any(|c| c.slug == *slug),
                None => true,
            })
            .collect();

        sort_tools(&mut tools);
        if let Some(limit) = filter.limit {
            tools.truncate(limit.max(0) as usize);
        }
        Ok(tools)
    }

    async fn find_tool(&self, slug: &str) -> Result<Option<ToolPayload>> {
        let tables = self.read()?;
        Ok(tables
            .tools
            .iter()
            .find(|t| t.slug == slug)
            .map(|t| tables.payload(t)))
    }

    async fn find_tool_by_id(&self, id: &str) -> Result<Option<ToolPayload>> {
        let tables = self.read()?;
        Ok(tables
            .tools
            .iter()
            .find(|t| t.id == id)
            .map(|t| tables.payload(t)))
    }

    async fn create_tool(&self, input: &ToolInput) -> Result<Tool> {
        let input = input.clone().normalized()?;
        let mut tables = self.write()?;

        if tables.tools.iter().any(|t| t.slug == input.slug) {
            bail!(ValidationError::DuplicateSlug(input.slug.clone()));
        }
        tables.check_tool_relations(&input)?;

        let now = now_ts();
        let tool = Tool {
            id: Uuid::new_v4().to_string(),
            name: input.name.clone(),
            slug: input.slug.clone(),
            description: input.description.clone(),
            website: input.website.clone(),
            repository: input.repository.clone(),
            score: input.score,
            stars: input.stars,
            published_at: input.published_at,
            last_commit_at: input.last_commit_at,
            created_at: now,
            updated_at: now,
        };
        tables.tools.push(tool.clone());
        tables.link_tool(&tool.id, &input);
        Ok(tool)
    }

    async fn update_tool(&self, id: &str, input: &ToolInput) -> Result<Option<Tool>> {
        let input = input.clone().normalized()?;
        let mut tables = self.write()?;

        if !tables.tools.iter().any(|t| t.id == id) {
            return Ok(None);
        }
        if tables
            .tools
            .iter()
            .any(|t| t.slug == input.slug && t.id != id)
        {
            bail!(ValidationError::DuplicateSlug(input.slug.clone()));
        }
        tables.check_tool_relations(&input)?;

        let updated = {
            let tool = tables
                .tools
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| anyhow!("tool not found: {}", id))?;
            tool.name = input.name.clone();
            tool.slug = input.slug.clone();
            tool.description = input.description.clone();
            tool.website = input.website.clone();
            tool.repository = input.repository.clone();
            tool.score = input.score;
            tool.stars = input.stars;
            tool.published_at = input.published_at;
            tool.last_commit_at = input.last_commit_at;
            tool.updated_at = now_ts();
            tool.clone()
        };
        tables.link_tool(id, &input);
        Ok(Some(updated))
    }

    async fn delete_tool(&self, id: &str) -> Result<bool> {
        let mut tables = self.write()?;
        let before = tables.tools.len();
        tables.tools.retain(|t| t.id != id);
        tables.tool_categories.retain(|(t, _)| t != id);
        tables.tool_alternatives.retain(|(t, _)| t != id);
        Ok(tables.tools.len() != before)
    }

    async fn list_alternatives(&self, now: i64) -> Result<Vec<AlternativeSummary>> {
        let tables = self.read()?;
        let published = tables.published_tool_ids(now);

        let mut summaries: Vec<AlternativeSummary> = tables
            .alternatives
            .iter()
            .map(|alt| AlternativeSummary {
                alternative: alt.clone(),
                tool_count: tables
                    .tool_alternatives
                    .iter()
                    .filter(|(t, a)| *a == alt.id && published.contains(t.as_str()))
                    .count() as i64,
            })
            .collect();

        sort_alternatives(&mut summaries);
        Ok(summaries)
    }

    async fn find_alternative(&self, slug: &str, now: i64) -> Result<Option<AlternativePayload>> {
        let tables = self.read()?;
        let Some(alternative) = tables.alternatives.iter().find(|a| a.slug == slug) else {
            return Ok(None);
        };

        let mut tools: Vec<ToolPayload> = tables
            .tool_alternatives
            .iter()
            .filter(|(_, a)| *a == alternative.id)
            .filter_map(|(t, _)| tables.tools.iter().find(|tool| tool.id == *t))
            .filter(|t| t.is_published(now))
            .map(|t| tables.payload(t))
            .collect();
        sort_tools(&mut tools);

        Ok(Some(AlternativePayload {
            alternative: alternative.clone(),
            tools,
        }))
    }

    async fn find_alternative_by_id(&self, id: &str) -> Result<Option<Alternative>> {
        let tables = self.read()?;
        Ok(tables.alternatives.iter().find(|a| a.id == id).cloned())
    }

    async fn create_alternative(&self, input: &AlternativeInput) -> Result<Alternative> {
        let input = input.clone().normalized()?;
        let mut tables = self.write()?;

        if tables.alternatives.iter().any(|a| a.slug == input.slug) {
            bail!(ValidationError::DuplicateSlug(input.slug.clone()));
        }

        let now = now_ts();
        let alternative = Alternative {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            slug: input.slug,
            description: input.description,
            website: input.website,
            created_at: now,
            updated_at: now,
        };
        tables.alternatives.push(alternative.clone());
        Ok(alternative)
    }

    async fn update_alternative(
        &self,
        id: &str,
        input: &AlternativeInput,
    ) -> Result<Option<Alternative>> {
        let input = input.clone().normalized()?;
        let mut tables = self.write()?;

        if tables
            .alternatives
            .iter()
            .any(|a| a.slug == input.slug && a.id != id)
        {
            bail!(ValidationError::DuplicateSlug(input.slug.clone()));
        }

        Ok(tables.alternatives.iter_mut().find(|a| a.id == id).map(|alt| {
            alt.name = input.name;
            alt.slug = input.slug;
            alt.description = input.description;
            alt.website = input.website;
            alt.updated_at = now_ts();
            alt.clone()
        }))
    }

    async fn delete_alternative(&self, id: &str) -> Result<bool> {
        let mut tables = self.write()?;
        let before = tables.alternatives.len();
        tables.alternatives.retain(|a| a.id != id);
        tables.tool_alternatives.retain(|(_, a)| a != id);
        Ok(tables.alternatives.len() != before)
    }

    async fn list_categories(&self, now: i64) -> Result<Vec<CategorySummary>> {
        let tables = self.read()?;
        let published = tables.published_tool_ids(now);

        let mut summaries: Vec<CategorySummary> = tables
            .categories
            .iter()
            .map(|cat| CategorySummary {
                category: cat.clone(),
                tool_count: tables
                    .tool_categories
                    .iter()
                    .filter(|(t, c)| *c == cat.id && published.contains(t.as_str()))
                    .count() as i64,
            })
            .collect();

        summaries.sort_by(|a, b| a.category.name.cmp(&b.category.name));
        Ok(summaries)
    }

    async fn find_category(&self, slug: &str) -> Result<Option<Category>> {
        let tables = self.read()?;
        Ok(tables.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn find_category_by_id(&self, id: &str) -> Result<Option<Category>> {
        let tables = self.read()?;
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn create_category(&self, input: &CategoryInput) -> Result<Category> {
        let input = input.clone().normalized()?;
        let mut tables = self.write()?;

        if tables.categories.iter().any(|c| c.slug == input.slug) {
            bail!(ValidationError::DuplicateSlug(input.slug.clone()));
        }

        let now = now_ts();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            slug: input.slug,
            label: input.label,
            created_at: now,
            updated_at: now,
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: &str,
        input: &CategoryInput,
    ) -> Result<Option<Category>> {
        let input = input.clone().normalized()?;
        let mut tables = self.write()?;

        if tables
            .categories
            .iter()
            .any(|c| c.slug == input.slug && c.id != id)
        {
            bail!(ValidationError::DuplicateSlug(input.slug.clone()));
        }

        Ok(tables.categories.iter_mut().find(|c| c.id == id).map(|cat| {
            cat.name = input.name;
            cat.slug = input.slug;
            cat.label = input.label;
            cat.updated_at = now_ts();
            cat.clone()
        }))
    }

    async fn delete_category(&self, id: &str) -> Result<bool> {
        let mut tables = self.write()?;
        let before = tables.categories.len();
        tables.categories.retain(|c| c.id != id);
        tables.tool_categories.retain(|(_, c)| c != id);
        Ok(tables.categories.len() != before)
    }

    async fn published_slugs(&self, slugs: &[String], now: i64) -> Result<HashSet<String>> {
        let tables = self.read()?;
        Ok(tables
            .tools
            .iter()
            .filter(|t| t.is_published(now) && slugs.contains(&t.slug))
            .map(|t| t.slug.clone())
            .collect())
    }

    async fn counts(&self, now: i64) -> Result<CatalogCounts> {
        let tables = self.read()?;
        Ok(CatalogCounts {
            tools: tables.tools.len() as i64,
            published_tools: tables.published_tool_ids(now).len() as i64,
            alternatives: tables.alternatives.len() as i64,
            categories: tables.categories.len() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_input(name: &str, score: i64, published: bool) -> ToolInput {
        ToolInput {
            name: name.to_string(),
            website: format!("https://{}.org", name.to_lowercase()),
            score,
            published_at: published.then_some(0),
            ..Default::default()
        }
    }

    fn category_input(name: &str) -> CategoryInput {
        CategoryInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn alternative_input(name: &str) -> AlternativeInput {
        AlternativeInput {
            name: name.to_string(),
            website: format!("https://{}.com", name.to_lowercase()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_find_tool_with_relations() {
        let store = InMemoryStore::new();
        let writing = store.create_category(&category_input("Writing")).await.unwrap();
        let docs = store.create_category(&category_input("Docs")).await.unwrap();
        let notion = store.create_alternative(&alternative_input("Notion")).await.unwrap();

        let mut input = tool_input("AppFlowy", 10, true);
        input.category_ids = vec![writing.id.clone(), docs.id.clone(), writing.id.clone()];
        input.alternative_ids = vec![notion.id.clone()];
        store.create_tool(&input).await.unwrap();

        let found = store.find_tool("appflowy").await.unwrap().unwrap();
        let cats: Vec<&str> = found.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(cats, vec!["Docs", "Writing"]);
        assert_eq!(found.alternatives.len(), 1);
    }

    #[tokio::test]
    async fn test_published_slugs_skips_hidden_and_missing() {
        let store = InMemoryStore::new();
        store.create_tool(&tool_input("Gitea", 1, true)).await.unwrap();
        store.create_tool(&tool_input("Draft", 1, false)).await.unwrap();

        let asked = vec!["gitea".to_string(), "draft".to_string(), "gone".to_string()];
        let visible = store.published_slugs(&asked, 100).await.unwrap();
        assert_eq!(visible, HashSet::from(["gitea".to_string()]));
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let store = InMemoryStore::new();
        store.create_tool(&tool_input("Gitea", 1, true)).await.unwrap();
        let err = store
            .create_tool(&tool_input("gitea", 2, true))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::DuplicateSlug("gitea".into()))
        );
    }

    #[tokio::test]
    async fn test_unknown_relation_rejected() {
        let store = InMemoryStore::new();
        let mut input = tool_input("Gitea", 1, true);
        input.category_ids = vec!["nope".into()];
        let err = store.create_tool(&input).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::UnknownCategory("nope".into()))
        );
    }

    #[tokio::test]
    async fn test_list_tools_orders_and_filters_published() {
        let store = InMemoryStore::new();
        store.create_tool(&tool_input("Beta", 5, true)).await.unwrap();
        store.create_tool(&tool_input("Alpha", 5, true)).await.unwrap();
        store.create_tool(&tool_input("Top", 9, true)).await.unwrap();
        store.create_tool(&tool_input("Draft", 99, false)).await.unwrap();

        let tools = store.list_tools(&ToolFilter::published(), 100).await.unwrap();
        let names: Vec<&str> = tools.iter().map(|p| p.tool.name.as_str()).collect();
        assert_eq!(names, vec!["Top", "Alpha", "Beta"]);

        let all = store.list_tools(&ToolFilter::default(), 100).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].tool.name, "Draft");
    }

    #[tokio::test]
    async fn test_alternative_counts_only_published_tools() {
        let store = InMemoryStore::new();
        let slack = store.create_alternative(&alternative_input("Slack")).await.unwrap();
        store.create_alternative(&alternative_input("Jira")).await.unwrap();

        let mut live = tool_input("Mattermost", 3, true);
        live.alternative_ids = vec![slack.id.clone()];
        store.create_tool(&live).await.unwrap();
        let mut draft = tool_input("Zulip", 8, false);
        draft.alternative_ids = vec![slack.id.clone()];
        store.create_tool(&draft).await.unwrap();

        let list = store.list_alternatives(100).await.unwrap();
        assert_eq!(list[0].alternative.name, "Slack");
        assert_eq!(list[0].tool_count, 1);
        assert_eq!(list[1].tool_count, 0);

        let payload = store.find_alternative("slack", 100).await.unwrap().unwrap();
        assert_eq!(payload.tools.len(), 1);
        assert_eq!(payload.tools[0].tool.name, "Mattermost");
    }

    #[tokio::test]
    async fn test_delete_category_unlinks_tools() {
        let store = InMemoryStore::new();
        let cat = store.create_category(&category_input("CRM")).await.unwrap();
        let mut input = tool_input("Twenty", 1, true);
        input.category_ids = vec![cat.id.clone()];
        store.create_tool(&input).await.unwrap();

        assert!(store.delete_category(&cat.id).await.unwrap());
        assert!(!store.delete_category(&cat.id).await.unwrap());
        let tool = store.find_tool("twenty").await.unwrap().unwrap();
        assert!(tool.categories.is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let store = InMemoryStore::new();
        let updated = store
            .update_tool("missing", &tool_input("X", 0, false))
            .await
            .unwrap();
        assert!(updated.is_none());
    }
}
