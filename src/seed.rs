//! JSON catalog import (`openalt seed`).
//!
//! A seed file lists categories, alternatives and tools. Tools refer to
//! their categories and alternatives by slug. Every record is upserted by
//! slug, so seeding the same file twice leaves the catalog unchanged.
//!
//! ```json
//! {
//!   "categories":   [{ "name": "Analytics", "label": "Analytics Tools" }],
//!   "alternatives": [{ "name": "Google Analytics", "website": "https://analytics.google.com" }],
//!   "tools": [{
//!     "name": "Plausible",
//!     "website": "https://plausible.io",
//!     "score": 80,
//!     "published_at": "2024-01-15",
//!     "categories": ["analytics"],
//!     "alternatives": ["google-analytics"]
//!   }]
//! }
//! ```
//!
//! `openalt export` writes the same format.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use openalt_core::models::{slugify, AlternativeInput, CategoryInput, ToolInput};
use openalt_core::store::CatalogStore;

use crate::config::Config;
use crate::dates::parse_date;
use crate::sqlite_store::SqliteStore;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub alternatives: Vec<SeedAlternative>,
    #[serde(default)]
    pub tools: Vec<SeedTool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeedAlternative {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub website: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SeedTool {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub website: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub stars: i64,
    /// `YYYY-MM-DD` or RFC 3339; absent means unpublished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit_at: Option<String>,
    /// Category slugs.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Alternative slugs.
    #[serde(default)]
    pub alternatives: Vec<String>,
}

/// Created/updated counts per entity kind.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: [usize; 3],
    pub updated: [usize; 3],
}

const CATEGORIES: usize = 0;
const ALTERNATIVES: usize = 1;
const TOOLS: usize = 2;

fn seed_slug(slug: &str, name: &str) -> String {
    if slug.trim().is_empty() {
        slugify(name)
    } else {
        slugify(slug)
    }
}

fn optional_date(value: &Option<String>, field: &str, tool: &str) -> Result<Option<i64>> {
    value
        .as_deref()
        .map(parse_date)
        .transpose()
        .with_context(|| format!("tool '{}': bad {}", tool, field))
}

/// Upsert every record of `seed` into `store`.
pub async fn apply_seed(store: &dyn CatalogStore, seed: &SeedFile) -> Result<SeedReport> {
    let now = chrono::Utc::now().timestamp();
    let mut report = SeedReport::default();

    let mut category_ids: HashMap<String, String> = HashMap::new();
    for c in &seed.categories {
        let slug = seed_slug(&c.slug, &c.name);
        let input = CategoryInput {
            name: c.name.clone(),
            slug: slug.clone(),
            label: c.label.clone(),
        };
        let id = match store.find_category(&slug).await? {
            Some(existing) => {
                store.update_category(&existing.id, &input).await?;
                report.updated[CATEGORIES] += 1;
                existing.id
            }
            None => {
                report.created[CATEGORIES] += 1;
                store.create_category(&input).await?.id
            }
        };
        category_ids.insert(slug, id);
    }

    let mut alternative_ids: HashMap<String, String> = HashMap::new();
    for a in &seed.alternatives {
        let slug = seed_slug(&a.slug, &a.name);
        let input = AlternativeInput {
            name: a.name.clone(),
            slug: slug.clone(),
            description: a.description.clone(),
            website: a.website.clone(),
        };
        let id = match store.find_alternative(&slug, now).await? {
            Some(existing) => {
                let id = existing.alternative.id;
                store.update_alternative(&id, &input).await?;
                report.updated[ALTERNATIVES] += 1;
                id
            }
            None => {
                report.created[ALTERNATIVES] += 1;
                store.create_alternative(&input).await?.id
            }
        };
        alternative_ids.insert(slug, id);
    }

    for t in &seed.tools {
        let slug = seed_slug(&t.slug, &t.name);

        let mut categories = Vec::with_capacity(t.categories.len());
        for c in &t.categories {
            let id = match category_ids.get(c) {
                Some(id) => id.clone(),
                None => store
                    .find_category(c)
                    .await?
                    .map(|cat| cat.id)
                    .ok_or_else(|| anyhow!("tool '{}': unknown category slug '{}'", t.name, c))?,
            };
            categories.push(id);
        }

        let mut alternatives = Vec::with_capacity(t.alternatives.len());
        for a in &t.alternatives {
            let id = match alternative_ids.get(a) {
                Some(id) => id.clone(),
                None => store
                    .find_alternative(a, now)
                    .await?
                    .map(|alt| alt.alternative.id)
                    .ok_or_else(|| {
                        anyhow!("tool '{}': unknown alternative slug '{}'", t.name, a)
                    })?,
            };
            alternatives.push(id);
        }

        let input = ToolInput {
            name: t.name.clone(),
            slug: slug.clone(),
            description: t.description.clone(),
            website: t.website.clone(),
            repository: t.repository.clone(),
            score: t.score,
            stars: t.stars,
            published_at: optional_date(&t.published_at, "published_at", &t.name)?,
            last_commit_at: optional_date(&t.last_commit_at, "last_commit_at", &t.name)?,
            category_ids: categories,
            alternative_ids: alternatives,
        };

        match store.find_tool(&slug).await? {
            Some(existing) => {
                store.update_tool(&existing.tool.id, &input).await?;
                report.updated[TOOLS] += 1;
            }
            None => {
                store.create_tool(&input).await?;
                report.created[TOOLS] += 1;
            }
        }
    }

    Ok(report)
}

pub fn read_seed_file(path: &Path) -> Result<SeedFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse seed file: {}", path.display()))
}

/// `openalt seed <file>`.
pub async fn run_seed(config: &Config, path: &Path) -> Result<()> {
    let seed = read_seed_file(path)?;
    let store = SqliteStore::open(config).await?;
    let report = apply_seed(&store, &seed).await?;

    println!("Seeded {}", path.display());
    for (label, i) in [
        ("categories", CATEGORIES),
        ("alternatives", ALTERNATIVES),
        ("tools", TOOLS),
    ] {
        println!(
            "  {:<14} {} created, {} updated",
            label, report.created[i], report.updated[i]
        );
    }

    store.pool().close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use openalt_core::models::ToolFilter;
    use openalt_core::store::memory::InMemoryStore;

    const SEED: &str = r#"{
        "categories": [
            { "name": "Analytics", "label": "Analytics Tools" },
            { "name": "Design" }
        ],
        "alternatives": [
            { "name": "Google Analytics", "website": "https://analytics.google.com" }
        ],
        "tools": [
            {
                "name": "Plausible",
                "website": "https://plausible.io",
                "score": 80,
                "published_at": "2024-01-15",
                "categories": ["analytics"],
                "alternatives": ["google-analytics"]
            },
            {
                "name": "Umami",
                "website": "https://umami.is",
                "score": 60,
                "categories": ["analytics"]
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = InMemoryStore::new();
        let seed: SeedFile = serde_json::from_str(SEED).unwrap();

        let first = apply_seed(&store, &seed).await.unwrap();
        assert_eq!(first.created, [2, 1, 2]);
        assert_eq!(first.updated, [0, 0, 0]);

        let second = apply_seed(&store, &seed).await.unwrap();
        assert_eq!(second.created, [0, 0, 0]);
        assert_eq!(second.updated, [2, 1, 2]);

        let counts = store.counts(i64::MAX).await.unwrap();
        assert_eq!(counts.tools, 2);
        assert_eq!(counts.published_tools, 1);
        assert_eq!(counts.categories, 2);
    }

    #[tokio::test]
    async fn test_seed_links_relations_by_slug() {
        let store = InMemoryStore::new();
        let seed: SeedFile = serde_json::from_str(SEED).unwrap();
        apply_seed(&store, &seed).await.unwrap();

        let tools = store
            .list_tools(&ToolFilter::default(), i64::MAX)
            .await
            .unwrap();
        let plausible = &tools[0];
        assert_eq!(plausible.tool.name, "Plausible");
        assert_eq!(plausible.categories[0].display_label(), "Analytics Tools");
        assert_eq!(plausible.alternatives[0].slug, "google-analytics");
        assert_eq!(plausible.tool.published_at, Some(1705276800));
    }

    #[tokio::test]
    async fn test_unknown_category_slug_fails() {
        let store = InMemoryStore::new();
        let seed: SeedFile = serde_json::from_str(
            r#"{ "tools": [{ "name": "X", "website": "https://x.dev", "categories": ["nope"] }] }"#,
        )
        .unwrap();
        let err = apply_seed(&store, &seed).await.unwrap_err();
        assert!(err.to_string().contains("unknown category slug 'nope'"));
    }

    #[tokio::test]
    async fn test_bad_date_names_tool() {
        let store = InMemoryStore::new();
        let seed: SeedFile = serde_json::from_str(
            r#"{ "tools": [{ "name": "X", "website": "https://x.dev", "published_at": "soon" }] }"#,
        )
        .unwrap();
        let err = apply_seed(&store, &seed).await.unwrap_err();
        assert!(err.to_string().contains("tool 'X': bad published_at"));
    }
}
