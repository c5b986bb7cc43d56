//! `/sitemap.xml` and `/robots.txt`.
//!
//! The sitemap lists the static pages and every published tool, every
//! alternative and every category, with absolute URLs built from
//! `site.url`. Tools carry a `lastmod` from their last update.

use anyhow::Result;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use openalt_core::models::ToolFilter;
use openalt_core::store::CatalogStore;

use crate::dates::format_date;
use crate::seo::absolute_url;
use crate::server::{AppState, PageError};

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

const STATIC_PAGES: [&str; 4] = ["/", "/alternatives", "/categories", "/submit"];

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub path: String,
    /// Unix seconds.
    pub lastmod: Option<i64>,
}

impl SitemapEntry {
    fn new(path: impl Into<String>, lastmod: Option<i64>) -> Self {
        Self {
            path: path.into(),
            lastmod,
        }
    }
}

/// Every public page the sitemap advertises, static pages first.
pub async fn collect_entries(store: &dyn CatalogStore, now: i64) -> Result<Vec<SitemapEntry>> {
    let mut entries: Vec<SitemapEntry> = STATIC_PAGES
        .iter()
        .map(|path| SitemapEntry::new(*path, None))
        .collect();

    for payload in store.list_tools(&ToolFilter::published(), now).await? {
        entries.push(SitemapEntry::new(
            format!("/tools/{}", payload.tool.slug),
            Some(payload.tool.updated_at),
        ));
    }
    for summary in store.list_alternatives(now).await? {
        entries.push(SitemapEntry::new(
            format!("/alternatives/{}", summary.alternative.slug),
            Some(summary.alternative.updated_at),
        ));
    }
    for summary in store.list_categories(now).await? {
        entries.push(SitemapEntry::new(
            format!("/categories/{}", summary.category.slug),
            Some(summary.category.updated_at),
        ));
    }

    Ok(entries)
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Serialize `entries` as a sitemap `urlset`.
pub fn render_sitemap(base_url: &str, entries: &[SitemapEntry]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS)]),
    ))?;

    for entry in entries {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        write_element(&mut writer, "loc", &absolute_url(base_url, &entry.path))?;
        if let Some(ts) = entry.lastmod {
            write_element(&mut writer, "lastmod", &format_date(ts))?;
        }
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("urlset")))?;
    Ok(String::from_utf8(writer.into_inner())?)
}

pub fn render_robots(base_url: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\nDisallow: /admin\n\nSitemap: {}\n",
        absolute_url(base_url, "/sitemap.xml")
    )
}

pub async fn handle_sitemap(State(state): State<AppState>) -> Result<Response, PageError> {
    let now = chrono::Utc::now().timestamp();
    let entries = collect_entries(state.store.as_ref(), now).await?;
    let xml = render_sitemap(&state.config.site.url, &entries)?;
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml).into_response())
}

pub async fn handle_robots(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        render_robots(&state.config.site.url),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use openalt_core::models::{CategoryInput, ToolInput};
    use openalt_core::store::memory::InMemoryStore;

    #[test]
    fn test_render_sitemap() {
        let entries = vec![
            SitemapEntry::new("/", None),
            SitemapEntry::new("/tools/a&b", Some(86400)),
        ];
        let xml = render_sitemap("https://openalt.example.org/", &entries).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"));
        assert!(xml.contains("<loc>https://openalt.example.org/</loc>"));
        assert!(xml.contains("<loc>https://openalt.example.org/tools/a&amp;b</loc>"));
        assert!(xml.contains("<lastmod>1970-01-02</lastmod>"));
    }

    #[test]
    fn test_robots_disallows_admin() {
        let robots = render_robots("https://openalt.example.org");
        assert!(robots.contains("Disallow: /admin\n"));
        assert!(robots.ends_with("Sitemap: https://openalt.example.org/sitemap.xml\n"));
    }

    #[tokio::test]
    async fn test_entries_skip_unpublished_tools() {
        let store = InMemoryStore::new();
        store
            .create_category(&CategoryInput {
                name: "Design".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        for (name, published_at) in [("Penpot", Some(0)), ("Draft", None)] {
            store
                .create_tool(&ToolInput {
                    name: name.into(),
                    website: "https://example.org".into(),
                    published_at,
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let entries = collect_entries(&store, 1_000).await.unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "/",
                "/alternatives",
                "/categories",
                "/submit",
                "/tools/penpot",
                "/categories/design"
            ]
        );
    }
}
