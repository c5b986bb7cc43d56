//! Catalog statistics (`openalt stats`).
//!
//! Prints record counts, the database size, and the categories with the
//! most published tools.

use anyhow::Result;

use openalt_core::store::CatalogStore;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let now = chrono::Utc::now().timestamp();
    let counts = store.counts(now).await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("{} — Catalog Stats", config.site.name);
    println!("================================");
    println!();
    println!("  Database:      {}", config.db.path.display());
    println!("  Size:          {}", format_bytes(db_size));
    println!("  Search:        {}", config.search.provider);
    println!();
    println!(
        "  Tools:         {} ({} published)",
        counts.tools, counts.published_tools
    );
    println!("  Alternatives:  {}", counts.alternatives);
    println!("  Categories:    {}", counts.categories);

    let mut categories = store.list_categories(now).await?;
    categories.retain(|c| c.tool_count > 0);
    categories.sort_by(|a, b| b.tool_count.cmp(&a.tool_count));

    if !categories.is_empty() {
        println!();
        println!("  Top categories:");
        println!("  {:<32} {:>6}", "CATEGORY", "TOOLS");
        println!("  {}", "-".repeat(39));
        for c in categories.iter().take(10) {
            println!("  {:<32} {:>6}", c.category.name, c.tool_count);
        }
    }

    println!();

    store.pool().close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::format_bytes;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
