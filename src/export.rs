//! Export the catalog as a seed file (`openalt export`).
//!
//! Produces the JSON format read by [`crate::seed`], including unpublished
//! tools, so an export can be re-seeded into an empty database.

use anyhow::Result;
use std::path::Path;

use openalt_core::models::ToolFilter;
use openalt_core::store::CatalogStore;

use crate::config::Config;
use crate::dates::format_rfc3339;
use crate::seed::{SeedAlternative, SeedCategory, SeedFile, SeedTool};
use crate::sqlite_store::SqliteStore;

/// Snapshot the whole catalog.
pub async fn build_export(store: &dyn CatalogStore) -> Result<SeedFile> {
    let now = chrono::Utc::now().timestamp();

    let categories = store
        .list_categories(now)
        .await?
        .into_iter()
        .map(|c| SeedCategory {
            name: c.category.name,
            slug: c.category.slug,
            label: c.category.label,
        })
        .collect();

    let alternatives = store
        .list_alternatives(now)
        .await?
        .into_iter()
        .map(|a| SeedAlternative {
            name: a.alternative.name,
            slug: a.alternative.slug,
            description: a.alternative.description,
            website: a.alternative.website,
        })
        .collect();

    let tools = store
        .list_tools(&ToolFilter::default(), now)
        .await?
        .into_iter()
        .map(|p| SeedTool {
            name: p.tool.name,
            slug: p.tool.slug,
            description: p.tool.description,
            website: p.tool.website,
            repository: p.tool.repository,
            score: p.tool.score,
            stars: p.tool.stars,
            published_at: p.tool.published_at.map(format_rfc3339),
            last_commit_at: p.tool.last_commit_at.map(format_rfc3339),
            categories: p.categories.into_iter().map(|c| c.slug).collect(),
            alternatives: p.alternatives.into_iter().map(|a| a.slug).collect(),
        })
        .collect();

    Ok(SeedFile {
        categories,
        alternatives,
        tools,
    })
}

/// Export the catalog as JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let data = build_export(&store).await?;
    let json = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)?;
            eprintln!(
                "Exported {} tools, {} alternatives, {} categories to {}",
                data.tools.len(),
                data.alternatives.len(),
                data.categories.len(),
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }

    store.pool().close().await;
    Ok(())
}
