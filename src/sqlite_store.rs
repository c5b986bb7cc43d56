//! SQLite-backed [`CatalogStore`] implementation.
//!
//! Maps each store operation onto the schema created by [`crate::migrate`]
//! (tools, alternatives, categories, the two join tables, and the
//! `tools_fts` full-text table). Tool mutations keep the tool's FTS row in
//! sync inside the same transaction.

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use openalt_core::error::ValidationError;
use openalt_core::models::{
    Alternative, AlternativeInput, AlternativePayload, AlternativeSummary, Category,
    CategoryInput, CategorySummary, Tool, ToolFilter, ToolInput, ToolPayload,
};
use openalt_core::store::{CatalogCounts, CatalogStore};

use crate::config::Config;
use crate::db;

/// SQLite implementation of the [`CatalogStore`] trait.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect using the `[db]` section of the config.
    pub async fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Rebuild every row of `tools_fts` from the catalog tables.
    pub async fn rebuild_search_index(&self) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM tools_fts").execute(&mut *tx).await?;
        let inserted = sqlx::query(&format!("{} FROM tools t", FTS_INSERT))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(inserted)
    }

    async fn with_relations(&self, tools: Vec<Tool>) -> Result<Vec<ToolPayload>> {
        if tools.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<&str> = tools.iter().map(|t| t.id.as_str()).collect();
        let mut category_rows = Vec::new();
        let mut alternative_rows = Vec::new();

        for chunk in ids.chunks(RELATION_BATCH) {
            let mut query = QueryBuilder::<Sqlite>::new(
                r#"
                SELECT tc.tool_id, c.id, c.name, c.slug, c.label, c.created_at, c.updated_at
                FROM tool_categories tc
                JOIN categories c ON c.id = tc.category_id
                WHERE tc.tool_id IN ("#,
            );
            push_ids(&mut query, chunk);
            query.push(") ORDER BY c.name ASC");
            category_rows.extend(query.build().fetch_all(&self.pool).await?);

            let mut query = QueryBuilder::<Sqlite>::new(
                r#"
                SELECT ta.tool_id, a.id, a.name, a.slug, a.description, a.website,
                       a.created_at, a.updated_at
                FROM tool_alternatives ta
                JOIN alternatives a ON a.id = ta.alternative_id
                WHERE ta.tool_id IN ("#,
            );
            push_ids(&mut query, chunk);
            query.push(") ORDER BY a.name ASC");
            alternative_rows.extend(query.build().fetch_all(&self.pool).await?);
        }

        let mut categories: HashMap<String, Vec<Category>> = HashMap::new();
        for row in &category_rows {
            categories
                .entry(row.get("tool_id"))
                .or_default()
                .push(category_from_row(row));
        }

        let mut alternatives: HashMap<String, Vec<Alternative>> = HashMap::new();
        for row in &alternative_rows {
            alternatives
                .entry(row.get("tool_id"))
                .or_default()
                .push(alternative_from_row(row));
        }

        Ok(tools
            .into_iter()
            .map(|tool| ToolPayload {
                categories: categories.remove(&tool.id).unwrap_or_default(),
                alternatives: alternatives.remove(&tool.id).unwrap_or_default(),
                tool,
            })
            .collect())
    }

    async fn fetch_tool(&self, column: &str, value: &str) -> Result<Option<ToolPayload>> {
        let row = sqlx::query(&format!("SELECT * FROM tools WHERE {} = ?", column))
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self
                .with_relations(vec![tool_from_row(&row)])
                .await?
                .pop()),
            None => Ok(None),
        }
    }
}

/// Tool ids bound per relation query, well under SQLite's variable limit.
const RELATION_BATCH: usize = 500;

fn push_ids<'a>(query: &mut QueryBuilder<'a, Sqlite>, ids: &[&'a str]) {
    let mut list = query.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
}

// ============ Row mapping ============

fn tool_from_row(row: &SqliteRow) -> Tool {
    Tool {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        website: row.get("website"),
        repository: row.get("repository"),
        score: row.get("score"),
        stars: row.get("stars"),
        published_at: row.get("published_at"),
        last_commit_at: row.get("last_commit_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn alternative_from_row(row: &SqliteRow) -> Alternative {
    Alternative {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        website: row.get("website"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn category_from_row(row: &SqliteRow) -> Category {
    Category {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        label: row.get("label"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============ Write helpers ============

const PUBLISHED: &str = "t.published_at IS NOT NULL AND t.published_at <= ?";

/// [`PUBLISHED`] without the placeholder, for [`QueryBuilder`] binds.
const PUBLISHED_PARAM: &str = "t.published_at IS NOT NULL AND t.published_at <= ";

/// Inserts one `tools_fts` row per selected tool; callers append the
/// `FROM tools t ...` clause.
const FTS_INSERT: &str = r#"
    INSERT INTO tools_fts (tool_id, name, description, keywords)
    SELECT t.id, t.name, COALESCE(t.description, ''),
           COALESCE((SELECT group_concat(c.name, ' ')
                     FROM tool_categories tc JOIN categories c ON c.id = tc.category_id
                     WHERE tc.tool_id = t.id), '')
           || ' ' ||
           COALESCE((SELECT group_concat(a.name, ' ')
                     FROM tool_alternatives ta JOIN alternatives a ON a.id = ta.alternative_id
                     WHERE ta.tool_id = t.id), '')
"#;

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Turn a UNIQUE violation into the store's duplicate-slug error.
fn slug_conflict(err: sqlx::Error, slug: &str) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            ValidationError::DuplicateSlug(slug.to_string()).into()
        }
        _ => err.into(),
    }
}

async fn check_tool_relations(conn: &mut SqliteConnection, input: &ToolInput) -> Result<()> {
    for id in &input.category_ids {
        let exists: bool = sqlx::query_scalar("SELECT COUNT(*) > 0 FROM categories WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        if !exists {
            bail!(ValidationError::UnknownCategory(id.clone()));
        }
    }
    for id in &input.alternative_ids {
        let exists: bool =
            sqlx::query_scalar("SELECT COUNT(*) > 0 FROM alternatives WHERE id = ?")
                .bind(id)
                .fetch_one(&mut *conn)
                .await?;
        if !exists {
            bail!(ValidationError::UnknownAlternative(id.clone()));
        }
    }
    Ok(())
}

async fn link_tool(conn: &mut SqliteConnection, tool_id: &str, input: &ToolInput) -> Result<()> {
    sqlx::query("DELETE FROM tool_categories WHERE tool_id = ?")
        .bind(tool_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM tool_alternatives WHERE tool_id = ?")
        .bind(tool_id)
        .execute(&mut *conn)
        .await?;

    for id in &input.category_ids {
        sqlx::query("INSERT OR IGNORE INTO tool_categories (tool_id, category_id) VALUES (?, ?)")
            .bind(tool_id)
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    for id in &input.alternative_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO tool_alternatives (tool_id, alternative_id) VALUES (?, ?)",
        )
        .bind(tool_id)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn refresh_tool_fts(conn: &mut SqliteConnection, tool_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM tools_fts WHERE tool_id = ?")
        .bind(tool_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(&format!("{} FROM tools t WHERE t.id = ?", FTS_INSERT))
        .bind(tool_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Refresh FTS rows of every tool linked through `join_table.column = id`.
async fn refresh_linked_fts(
    conn: &mut SqliteConnection,
    join_table: &str,
    column: &str,
    id: &str,
) -> Result<()> {
    let tool_ids: Vec<String> = sqlx::query_scalar(&format!(
        "SELECT tool_id FROM {} WHERE {} = ?",
        join_table, column
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    for tool_id in &tool_ids {
        refresh_tool_fts(conn, tool_id).await?;
    }
    Ok(())
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn list_tools(&self, filter: &ToolFilter, now: i64) -> Result<Vec<ToolPayload>> {
        let rows = sqlx::query(
            r#"
            SELECT t.* FROM tools t
            WHERE (? = 0 OR (t.published_at IS NOT NULL AND t.published_at <= ?))
              AND (? IS NULL OR EXISTS (
                    SELECT 1 FROM tool_categories tc
                    JOIN categories c ON c.id = tc.category_id
                    WHERE tc.tool_id = t.id AND c.slug = ?))
            ORDER BY t.score DESC, t.name ASC
            LIMIT ?
            "#,
        )
        .bind(filter.published_only)
        .bind(now)
        .bind(&filter.category)
        .bind(&filter.category)
        .bind(filter.limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        let tools = rows.iter().map(tool_from_row).collect();
        self.with_relations(tools).await
    }

    async fn find_tool(&self, slug: &str) -> Result<Option<ToolPayload>> {
        self.fetch_tool("slug", slug).await
    }

    async fn find_tool_by_id(&self, id: &str) -> Result<Option<ToolPayload>> {
        self.fetch_tool("id", id).await
    }

    async fn create_tool(&self, input: &ToolInput) -> Result<Tool> {
        let input = input.clone().normalized()?;
        let mut tx = self.pool.begin().await?;
        check_tool_relations(&mut tx, &input).await?;

        let id = Uuid::new_v4().to_string();
        let now = now_ts();
        sqlx::query(
            r#"
            INSERT INTO tools (id, name, slug, description, website, repository, score, stars,
                               published_at, last_commit_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.website)
        .bind(&input.repository)
        .bind(input.score)
        .bind(input.stars)
        .bind(input.published_at)
        .bind(input.last_commit_at)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| slug_conflict(e, &input.slug))?;

        link_tool(&mut tx, &id, &input).await?;
        refresh_tool_fts(&mut tx, &id).await?;
        tx.commit().await?;

        Ok(Tool {
            id,
            name: input.name,
            slug: input.slug,
            description: input.description,
            website: input.website,
            repository: input.repository,
            score: input.score,
            stars: input.stars,
            published_at: input.published_at,
            last_commit_at: input.last_commit_at,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_tool(&self, id: &str, input: &ToolInput) -> Result<Option<Tool>> {
        let input = input.clone().normalized()?;
        let mut tx = self.pool.begin().await?;
        check_tool_relations(&mut tx, &input).await?;

        let updated = sqlx::query(
            r#"
            UPDATE tools SET name = ?, slug = ?, description = ?, website = ?, repository = ?,
                             score = ?, stars = ?, published_at = ?, last_commit_at = ?,
                             updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.website)
        .bind(&input.repository)
        .bind(input.score)
        .bind(input.stars)
        .bind(input.published_at)
        .bind(input.last_commit_at)
        .bind(now_ts())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| slug_conflict(e, &input.slug))?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }

        link_tool(&mut tx, id, &input).await?;
        refresh_tool_fts(&mut tx, id).await?;
        tx.commit().await?;

        Ok(self.find_tool_by_id(id).await?.map(|p| p.tool))
    }

    async fn delete_tool(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM tools_fts WHERE tool_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM tools WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn list_alternatives(&self, now: i64) -> Result<Vec<AlternativeSummary>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT a.*,
                   (SELECT COUNT(*) FROM tool_alternatives ta
                    JOIN tools t ON t.id = ta.tool_id
                    WHERE ta.alternative_id = a.id AND {}) AS tool_count
            FROM alternatives a
            ORDER BY tool_count DESC, a.name ASC
            "#,
            PUBLISHED
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| AlternativeSummary {
                alternative: alternative_from_row(row),
                tool_count: row.get("tool_count"),
            })
            .collect())
    }

    async fn find_alternative(&self, slug: &str, now: i64) -> Result<Option<AlternativePayload>> {
        let Some(row) = sqlx::query("SELECT * FROM alternatives WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        let alternative = alternative_from_row(&row);

        let tool_rows = sqlx::query(&format!(
            r#"
            SELECT t.* FROM tools t
            JOIN tool_alternatives ta ON ta.tool_id = t.id
            WHERE ta.alternative_id = ? AND {}
            ORDER BY t.score DESC, t.name ASC
            "#,
            PUBLISHED
        ))
        .bind(&alternative.id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        let tools = self
            .with_relations(tool_rows.iter().map(tool_from_row).collect())
            .await?;

        Ok(Some(AlternativePayload { alternative, tools }))
    }

    async fn find_alternative_by_id(&self, id: &str) -> Result<Option<Alternative>> {
        let row = sqlx::query("SELECT * FROM alternatives WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(alternative_from_row))
    }

    async fn create_alternative(&self, input: &AlternativeInput) -> Result<Alternative> {
        let input = input.clone().normalized()?;
        let id = Uuid::new_v4().to_string();
        let now = now_ts();

        sqlx::query(
            r#"
            INSERT INTO alternatives (id, name, slug, description, website, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.website)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| slug_conflict(e, &input.slug))?;

        Ok(Alternative {
            id,
            name: input.name,
            slug: input.slug,
            description: input.description,
            website: input.website,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_alternative(
        &self,
        id: &str,
        input: &AlternativeInput,
    ) -> Result<Option<Alternative>> {
        let input = input.clone().normalized()?;
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE alternatives
            SET name = ?, slug = ?, description = ?, website = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(&input.website)
        .bind(now_ts())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| slug_conflict(e, &input.slug))?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }

        refresh_linked_fts(&mut tx, "tool_alternatives", "alternative_id", id).await?;
        tx.commit().await?;
        self.find_alternative_by_id(id).await
    }

    async fn delete_alternative(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let linked: Vec<String> =
            sqlx::query_scalar("SELECT tool_id FROM tool_alternatives WHERE alternative_id = ?")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let deleted = sqlx::query("DELETE FROM alternatives WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for tool_id in &linked {
            refresh_tool_fts(&mut tx, tool_id).await?;
        }
        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn list_categories(&self, now: i64) -> Result<Vec<CategorySummary>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT c.*,
                   (SELECT COUNT(*) FROM tool_categories tc
                    JOIN tools t ON t.id = tc.tool_id
                    WHERE tc.category_id = c.id AND {}) AS tool_count
            FROM categories c
            ORDER BY c.name ASC
            "#,
            PUBLISHED
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| CategorySummary {
                category: category_from_row(row),
                tool_count: row.get("tool_count"),
            })
            .collect())
    }

    async fn find_category(&self, slug: &str) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(category_from_row))
    }

    async fn find_category_by_id(&self, id: &str) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(category_from_row))
    }

    async fn create_category(&self, input: &CategoryInput) -> Result<Category> {
        let input = input.clone().normalized()?;
        let id = Uuid::new_v4().to_string();
        let now = now_ts();

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, label, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.label)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| slug_conflict(e, &input.slug))?;

        Ok(Category {
            id,
            name: input.name,
            slug: input.slug,
            label: input.label,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_category(
        &self,
        id: &str,
        input: &CategoryInput,
    ) -> Result<Option<Category>> {
        let input = input.clone().normalized()?;
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE categories SET name = ?, slug = ?, label = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.label)
        .bind(now_ts())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| slug_conflict(e, &input.slug))?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }

        refresh_linked_fts(&mut tx, "tool_categories", "category_id", id).await?;
        tx.commit().await?;
        self.find_category_by_id(id).await
    }

    async fn delete_category(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let linked: Vec<String> =
            sqlx::query_scalar("SELECT tool_id FROM tool_categories WHERE category_id = ?")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let deleted = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        for tool_id in &linked {
            refresh_tool_fts(&mut tx, tool_id).await?;
        }
        tx.commit().await?;
        Ok(deleted > 0)
    }

    async fn published_slugs(&self, slugs: &[String], now: i64) -> Result<HashSet<String>> {
        let mut visible = HashSet::new();
        let slugs: Vec<&str> = slugs.iter().map(String::as_str).collect();

        for chunk in slugs.chunks(RELATION_BATCH) {
            let mut query = QueryBuilder::<Sqlite>::new("SELECT t.slug FROM tools t WHERE ");
            query.push(PUBLISHED_PARAM).push_bind(now);
            query.push(" AND t.slug IN (");
            push_ids(&mut query, chunk);
            query.push(")");
            let found: Vec<String> = query.build_query_scalar().fetch_all(&self.pool).await?;
            visible.extend(found);
        }

        Ok(visible)
    }

    async fn counts(&self, now: i64) -> Result<CatalogCounts> {
        let tools: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tools")
            .fetch_one(&self.pool)
            .await?;
        let published_tools: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM tools t WHERE {}", PUBLISHED))
                .bind(now)
                .fetch_one(&self.pool)
                .await?;
        let alternatives: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alternatives")
            .fetch_one(&self.pool)
            .await?;
        let categories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;

        Ok(CatalogCounts {
            tools,
            published_tools,
            alternatives,
            categories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        SqliteStore::new(crate::db::connect_in_memory().await.unwrap())
    }

    fn tool_input(name: &str, score: i64) -> ToolInput {
        ToolInput {
            name: name.to_string(),
            website: format!("https://{}.org", name.to_lowercase()),
            score,
            published_at: Some(0),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_tool_roundtrip_with_relations() {
        let store = store().await;
        let cat = store
            .create_category(&CategoryInput {
                name: "Design".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let figma = store
            .create_alternative(&AlternativeInput {
                name: "Figma".into(),
                website: "https://figma.com".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut input = tool_input("Penpot", 42);
        input.category_ids = vec![cat.id.clone()];
        input.alternative_ids = vec![figma.id.clone()];
        let created = store.create_tool(&input).await.unwrap();
        assert_eq!(created.slug, "penpot");

        let found = store.find_tool("penpot").await.unwrap().unwrap();
        assert_eq!(found.categories[0].slug, "design");
        assert_eq!(found.alternatives[0].slug, "figma");

        let alt = store.find_alternative("figma", 100).await.unwrap().unwrap();
        assert_eq!(alt.tools.len(), 1);
        assert_eq!(alt.tools[0].categories.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_slug_maps_to_conflict() {
        let store = store().await;
        store.create_tool(&tool_input("Gitea", 1)).await.unwrap();
        let err = store.create_tool(&tool_input("Gitea", 2)).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::DuplicateSlug("gitea".into()))
        );
    }

    #[tokio::test]
    async fn test_list_tools_by_category_and_order() {
        let store = store().await;
        let cat = store
            .create_category(&CategoryInput {
                name: "Git".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        for (name, score) in [("Forgejo", 5), ("Gitea", 9), ("GitLab", 5)] {
            let mut input = tool_input(name, score);
            input.category_ids = vec![cat.id.clone()];
            store.create_tool(&input).await.unwrap();
        }
        store.create_tool(&tool_input("Other", 100)).await.unwrap();

        let filter = ToolFilter {
            published_only: true,
            category: Some("git".into()),
            limit: None,
        };
        let tools = store.list_tools(&filter, 100).await.unwrap();
        let names: Vec<&str> = tools.iter().map(|p| p.tool.name.as_str()).collect();
        assert_eq!(names, vec!["Gitea", "Forgejo", "GitLab"]);

        let cats = store.list_categories(100).await.unwrap();
        assert_eq!(cats[0].tool_count, 3);
    }

    #[tokio::test]
    async fn test_delete_tool_cascades_links() {
        let store = store().await;
        let cat = store
            .create_category(&CategoryInput {
                name: "Chat".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let mut input = tool_input("Zulip", 1);
        input.category_ids = vec![cat.id.clone()];
        let tool = store.create_tool(&input).await.unwrap();

        assert!(store.delete_tool(&tool.id).await.unwrap());
        let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tool_categories")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(links, 0);
        let fts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tools_fts")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(fts, 0);
    }

    #[tokio::test]
    async fn test_update_unknown_relation_fails() {
        let store = store().await;
        let tool = store.create_tool(&tool_input("Zulip", 1)).await.unwrap();
        let mut input = tool_input("Zulip", 1);
        input.alternative_ids = vec!["missing".into()];
        let err = store.update_tool(&tool.id, &input).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::UnknownAlternative("missing".into()))
        );
    }
    #[tokio::test]
    async fn test_find_tool_loads_only_its_own_relations() {
        let store = store().await;
        let chat = store
            .create_category(&CategoryInput {
                name: "Chat".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let video = store
            .create_category(&CategoryInput {
                name: "Video".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut zulip = tool_input("Zulip", 1);
        zulip.category_ids = vec![chat.id.clone()];
        store.create_tool(&zulip).await.unwrap();
        let mut jitsi = tool_input("Jitsi", 2);
        jitsi.category_ids = vec![video.id.clone(), chat.id.clone()];
        store.create_tool(&jitsi).await.unwrap();

        let found = store.find_tool("zulip").await.unwrap().unwrap();
        let names: Vec<&str> = found.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Chat"]);

        let found = store.find_tool("jitsi").await.unwrap().unwrap();
        let names: Vec<&str> = found.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Chat", "Video"]);
    }

    #[tokio::test]
    async fn test_relations_load_across_batches() {
        let store = store().await;
        let cat = store
            .create_category(&CategoryInput {
                name: "Chat".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        for i in 0..=RELATION_BATCH {
            let mut input = tool_input(&format!("Tool {}", i), 1);
            input.category_ids = vec![cat.id.clone()];
            store.create_tool(&input).await.unwrap();
        }

        let tools = store
            .list_tools(&ToolFilter::published(), now_ts())
            .await
            .unwrap();
        assert_eq!(tools.len(), RELATION_BATCH + 1);
        assert!(tools.iter().all(|p| p.categories.len() == 1));
    }

    #[tokio::test]
    async fn test_published_slugs_skips_hidden_and_missing() {
        let store = store().await;
        store.create_tool(&tool_input("Gitea", 1)).await.unwrap();
        let mut draft = tool_input("Draft", 1);
        draft.published_at = None;
        store.create_tool(&draft).await.unwrap();

        let asked = vec!["gitea".to_string(), "draft".to_string(), "gone".to_string()];
        let visible = store.published_slugs(&asked, now_ts()).await.unwrap();
        assert_eq!(visible, HashSet::from(["gitea".to_string()]));
    }
}
