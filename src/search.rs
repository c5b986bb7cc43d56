//! Search index implementations and the `openalt search` / `openalt index`
//! commands.
//!
//! Two backends implement [`SearchIndex`]:
//!
//! | Backend | Config | Storage |
//! |---------|--------|---------|
//! | [`LocalIndex`] | `provider = "local"` | SQLite FTS5 table `tools_fts` |
//! | [`HostedIndex`] | `provider = "hosted"` | Algolia-compatible REST API |
//!
//! An empty query returns the unfiltered listing ordered by score.
//!
//! The hosted index only changes on `openalt index rebuild`, so it can
//! still hold tools that were since deleted or unpublished. Callers wrap
//! either backend in [`CheckedIndex`], which drops hits the store no
//! longer shows.
//!
//! # Local query syntax
//!
//! User text is never passed to FTS5 verbatim. It is split into
//! alphanumeric terms and each term becomes a quoted prefix match, so
//! `"post gre"` matches `PostgreSQL` and punctuation cannot produce an
//! FTS syntax error.
//!
//! # Hosted retries
//!
//! The hosted client retries HTTP 429, 5xx and network errors with
//! exponential backoff (1s, 2s, 4s, ...) up to `max_retries` times. Other
//! 4xx responses fail immediately.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use sqlx::{Row, SqlitePool};

use openalt_core::models::{ToolFilter, ToolPayload};
use openalt_core::search::{SearchHit, SearchIndex};
use openalt_core::store::CatalogStore;

use crate::config::{Config, HostedSearchConfig};
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Build the index selected by `[search] provider`.
pub fn create_index(config: &Config, pool: SqlitePool) -> Result<Arc<dyn SearchIndex>> {
    match config.search.provider.as_str() {
        "local" => Ok(Arc::new(LocalIndex::new(pool))),
        "hosted" => {
            let hosted = config
                .search
                .hosted
                .as_ref()
                .ok_or_else(|| anyhow!("[search.hosted] is required for provider 'hosted'"))?;
            Ok(Arc::new(HostedIndex::from_config(hosted)?))
        }
        other => bail!("Unknown search provider: {}", other),
    }
}

// ============ Store check ============

/// A [`SearchIndex`] whose hits are checked against the catalog.
///
/// Hits naming a missing or unpublished tool are dropped, so a result page
/// may hold fewer than `limit` hits until the index is rebuilt.
pub struct CheckedIndex {
    inner: Arc<dyn SearchIndex>,
    store: Arc<dyn CatalogStore>,
}

impl CheckedIndex {
    pub fn new(inner: Arc<dyn SearchIndex>, store: Arc<dyn CatalogStore>) -> Self {
        Self { inner, store }
    }
}

#[async_trait]
impl SearchIndex for CheckedIndex {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn query(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let hits = self.inner.query(query, limit).await?;
        if hits.is_empty() {
            return Ok(hits);
        }

        let slugs: Vec<String> = hits.iter().map(|h| h.slug.clone()).collect();
        let now = chrono::Utc::now().timestamp();
        let visible = self.store.published_slugs(&slugs, now).await?;

        let dropped = hits.len() - visible.len().min(hits.len());
        if dropped > 0 {
            tracing::debug!(index = self.inner.name(), dropped, "stale search hits");
        }
        Ok(hits
            .into_iter()
            .filter(|h| visible.contains(&h.slug))
            .collect())
    }
}

/// The configured index over `pool`, checked against the same database.
pub fn open_index(config: &Config, pool: SqlitePool) -> Result<Arc<dyn SearchIndex>> {
    let inner = create_index(config, pool.clone())?;
    let store: Arc<dyn CatalogStore> = Arc::new(SqliteStore::new(pool));
    Ok(Arc::new(CheckedIndex::new(inner, store)))
}

// ============ Local index ============

/// Full-text index backed by the `tools_fts` table.
pub struct LocalIndex {
    pool: SqlitePool,
}

impl LocalIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Turn free text into an FTS5 MATCH expression, or `None` if it has no
/// searchable terms.
pub fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"*", t.to_lowercase()))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

fn hit_from_row(row: &sqlx::sqlite::SqliteRow) -> SearchHit {
    SearchHit {
        slug: row.get("slug"),
        name: row.get("name"),
        description: row.get("description"),
        website: row.get("website"),
        score: row.get("score"),
    }
}

#[async_trait]
impl SearchIndex for LocalIndex {
    fn name(&self) -> &str {
        "local"
    }

    async fn query(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let now = chrono::Utc::now().timestamp();
        let limit = limit as i64;

        let rows = match fts_query(query) {
            None => {
                sqlx::query(
                    r#"
                    SELECT t.slug, t.name, t.description, t.website, t.score
                    FROM tools t
                    WHERE t.published_at IS NOT NULL AND t.published_at <= ?
                    ORDER BY t.score DESC, t.name ASC
                    LIMIT ?
                    "#,
                )
                .bind(now)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            Some(expr) => {
                sqlx::query(
                    r#"
                    SELECT t.slug, t.name, t.description, t.website, t.score
                    FROM tools_fts
                    JOIN tools t ON t.id = tools_fts.tool_id
                    WHERE tools_fts MATCH ?
                      AND t.published_at IS NOT NULL AND t.published_at <= ?
                    ORDER BY tools_fts.rank, t.score DESC, t.name ASC
                    LIMIT ?
                    "#,
                )
                .bind(expr)
                .bind(now)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(hit_from_row).collect())
    }
}

// ============ Hosted index ============

/// A record pushed to the hosted index. `objectID` is the tool id.
#[derive(Debug, Serialize)]
pub struct SearchRecord {
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub website: String,
    pub score: i64,
    pub categories: Vec<String>,
    pub alternatives: Vec<String>,
}

impl From<&ToolPayload> for SearchRecord {
    fn from(payload: &ToolPayload) -> Self {
        Self {
            object_id: payload.tool.id.clone(),
            slug: payload.tool.slug.clone(),
            name: payload.tool.name.clone(),
            description: payload.tool.description.clone(),
            website: payload.tool.website.clone(),
            score: payload.tool.score,
            categories: payload.categories.iter().map(|c| c.name.clone()).collect(),
            alternatives: payload.alternatives.iter().map(|a| a.name.clone()).collect(),
        }
    }
}

/// Client for an Algolia-compatible search REST API.
pub struct HostedIndex {
    client: reqwest::Client,
    endpoint: String,
    app_id: String,
    index: String,
    api_key: String,
    max_retries: u32,
    backoff: Duration,
}

impl HostedIndex {
    pub fn new(
        endpoint: impl Into<String>,
        app_id: impl Into<String>,
        index: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            app_id: app_id.into(),
            index: index.into(),
            api_key: api_key.into(),
            max_retries,
            backoff: Duration::from_secs(1),
        })
    }

    /// Read the API key from `api_key_env` and build the client.
    pub fn from_config(config: &HostedSearchConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow!("{} not set", config.api_key_env))?;
        Self::new(
            config.endpoint(),
            &config.app_id,
            &config.index,
            api_key,
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )
    }

    /// Base delay of the exponential backoff.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Replace or insert records, keyed by `objectID`.
    pub async fn push(&self, records: &[SearchRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let requests: Vec<serde_json::Value> = records
            .iter()
            .map(|r| json!({ "action": "updateObject", "body": r }))
            .collect();
        self.post("batch", &json!({ "requests": requests })).await?;
        Ok(())
    }

    /// Remove every record from the index.
    pub async fn clear(&self) -> Result<()> {
        self.post("clear", &json!({})).await?;
        Ok(())
    }

    async fn post(&self, action: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        let url = format!("{}/1/indexes/{}/{}", self.endpoint, self.index, action);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff * (1u32 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .header("X-Algolia-Application-Id", &self.app_id)
                .header("X-Algolia-API-Key", &self.api_key)
                .json(body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(response.json().await?);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        tracing::warn!(%status, attempt, "hosted search retryable error");
                        last_err = Some(anyhow!("Search API error {}: {}", status, body_text));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Search API error {}: {}", status, body_text);
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "hosted search request failed");
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("Search request failed after retries")))
    }
}

#[async_trait]
impl SearchIndex for HostedIndex {
    fn name(&self) -> &str {
        "hosted"
    }

    async fn query(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let json = self
            .post(
                "query",
                &json!({ "query": query.trim(), "hitsPerPage": limit }),
            )
            .await?;
        parse_hits(&json)
    }
}

/// Extract `hits[]` from a query response.
fn parse_hits(json: &serde_json::Value) -> Result<Vec<SearchHit>> {
    let hits = json
        .get("hits")
        .and_then(|h| h.as_array())
        .ok_or_else(|| anyhow!("Invalid search response: missing hits array"))?;

    hits.iter()
        .map(|hit| {
            serde_json::from_value(hit.clone())
                .map_err(|e| anyhow!("Invalid search hit: {}", e))
        })
        .collect()
}

// ============ Commands ============

/// `openalt search <query>`: print ranked hits.
pub async fn run_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    let pool = db::connect(config).await?;
    let index = open_index(config, pool.clone())?;
    let hits = index
        .query(query, limit.unwrap_or(config.search.limit))
        .await?;

    print_hits(&hits);

    pool.close().await;
    Ok(())
}

pub fn print_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No results.");
        return;
    }

    for (i, hit) in hits.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, hit.score, hit.name);
        if let Some(ref description) = hit.description {
            println!("    {}", description.replace('\n', " ").trim());
        }
        println!("    url: {}", hit.website);
        println!("    slug: {}", hit.slug);
        println!();
    }
}

/// `openalt index rebuild`: regenerate the configured index from the
/// catalog.
pub async fn rebuild_index(config: &Config) -> Result<()> {
    let store = SqliteStore::open(config).await?;

    match config.search.provider.as_str() {
        "hosted" => {
            let hosted = config
                .search
                .hosted
                .as_ref()
                .ok_or_else(|| anyhow!("[search.hosted] is required for provider 'hosted'"))?;
            let index = HostedIndex::from_config(hosted)?;

            let now = chrono::Utc::now().timestamp();
            let tools = store.list_tools(&ToolFilter::published(), now).await?;
            let records: Vec<SearchRecord> = tools.iter().map(SearchRecord::from).collect();

            index.clear().await?;
            for batch in records.chunks(1000) {
                index.push(batch).await?;
            }
            println!("Rebuilt hosted index '{}': {} tools", hosted.index, records.len());
        }
        _ => {
            let count = store.rebuild_search_index().await?;
            println!("Rebuilt local index: {} tools", count);
        }
    }

    store.pool().close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use openalt_core::models::{CategoryInput, ToolInput};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_fts_query_quotes_terms() {
        assert_eq!(fts_query("post gre").as_deref(), Some("\"post\"* \"gre\"*"));
        assert_eq!(fts_query("C++ \"IDE\"").as_deref(), Some("\"c\"* \"ide\"*"));
        assert_eq!(fts_query("  -- "), None);
        assert_eq!(fts_query(""), None);
    }

    async fn seeded_store() -> SqliteStore {
        let store = SqliteStore::new(crate::db::connect_in_memory().await.unwrap());

        let db_cat = store
            .create_category(&CategoryInput {
                name: "Database".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let tools = [
            ("PostgreSQL", 90, Some(0), vec![db_cat.id.clone()]),
            ("Supabase", 80, Some(0), vec![db_cat.id.clone()]),
            ("Penpot", 70, Some(0), vec![]),
            ("Hidden Draft", 100, None, vec![]),
        ];
        for (name, score, published_at, category_ids) in tools {
            store
                .create_tool(&ToolInput {
                    name: name.into(),
                    website: "https://example.org".into(),
                    score,
                    published_at,
                    category_ids,
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_local_empty_query_lists_published_by_score() {
        let store = seeded_store().await;
        let index = LocalIndex::new(store.pool().clone());
        let hits = index.query("  ", 10).await.unwrap();
        let names: Vec<&str> = hits.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["PostgreSQL", "Supabase", "Penpot"]);
    }

    #[tokio::test]
    async fn test_local_prefix_match_and_keywords() {
        let store = seeded_store().await;
        let index = LocalIndex::new(store.pool().clone());

        let hits = index.query("postg", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].slug, "postgresql");

        // category names are indexed as keywords
        let hits = index.query("database", 10).await.unwrap();
        assert_eq!(hits.len(), 2);

        // unpublished tools never match
        assert!(index.query("hidden", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_index_rebuild_restores_rows() {
        let store = seeded_store().await;
        sqlx::query("DELETE FROM tools_fts")
            .execute(store.pool())
            .await
            .unwrap();
        assert_eq!(store.rebuild_search_index().await.unwrap(), 4);

        let index = LocalIndex::new(store.pool().clone());
        assert_eq!(index.query("penpot", 10).await.unwrap().len(), 1);
    }

    async fn spawn_mock(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_hosted_retries_server_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let router = Router::new().route(
            "/1/indexes/tools/query",
            post(move |Json(body): Json<serde_json::Value>| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})));
                    }
                    let query = body["query"].as_str().unwrap_or_default().to_string();
                    (
                        StatusCode::OK,
                        Json(json!({ "hits": [{
                            "objectID": "1",
                            "slug": "gitea",
                            "name": query,
                            "website": "https://gitea.com",
                            "score": 3
                        }]})),
                    )
                }
            }),
        );
        let base = spawn_mock(router).await;

        let index = HostedIndex::new(base, "APP", "tools", "key", Duration::from_secs(5), 2)
            .unwrap()
            .with_backoff(Duration::from_millis(5));
        let hits = index.query("git", 5).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(hits[0].name, "git");
        assert_eq!(hits[0].description, None);
    }

    #[tokio::test]
    async fn test_hosted_client_error_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let router = Router::new().route(
            "/1/indexes/tools/query",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::FORBIDDEN, "invalid api key")
                }
            }),
        );
        let base = spawn_mock(router).await;

        let index = HostedIndex::new(base, "APP", "tools", "bad", Duration::from_secs(5), 3)
            .unwrap()
            .with_backoff(Duration::from_millis(5));
        let err = index.query("git", 5).await.unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_parse_hits_requires_array() {
        assert!(parse_hits(&json!({ "nbHits": 0 })).is_err());
        assert!(parse_hits(&json!({ "hits": [] })).unwrap().is_empty());
    }
}
