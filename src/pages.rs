//! Public page composition.
//!
//! Each handler fetches from the store (and the search index on `/search`),
//! derives what the page needs (top tools, category ranking, summary
//! sentences, related tools), and renders through [`crate::views`].
//!
//! Only published tools are ever shown; a missing or unpublished tool is a
//! 404 page.

use axum::{
    extract::{Form, Path, Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
};
use maud::{html, Markup};
use serde::Deserialize;

use openalt_core::error::ValidationError;
use openalt_core::models::{ToolFilter, ToolInput};
use openalt_core::ranking::{rank_categories, related_tools, top_tools, TOP_TOOLS};
use openalt_core::summary::alternative_summary;

use crate::ads::pick_ad;
use crate::breadcrumbs::Breadcrumbs;
use crate::dates::format_relative;
use crate::seo::PageMeta;
use crate::server::{AppState, PageError};
use crate::views::components::{
    ad_slot, alternative_card, badges, category_card, category_ranking, count_label, hit_list,
    tool_card, tool_list,
};
use crate::views::layout;
use crate::views::search_box::search_box;

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn render(
    state: &AppState,
    meta: &PageMeta,
    breadcrumbs: Option<&Breadcrumbs>,
    body: Markup,
) -> Html<String> {
    Html(layout(&state.config, meta, breadcrumbs, body).into_string())
}

fn ad(state: &AppState, slot: &str, page_key: &str) -> Markup {
    ad_slot(pick_ad(&state.config.ads, slot, page_key), slot)
}

fn listing_filter(state: &AppState) -> ToolFilter {
    ToolFilter {
        limit: Some(state.config.listing.limit),
        ..ToolFilter::published()
    }
}

// ============ Listing ============

pub async fn home(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let tools = state.store.list_tools(&listing_filter(&state), now()).await?;
    let site = &state.config.site;

    let body = html! {
        section.hero {
            h1 { (site.tagline) }
            p.muted { (site.description) }
        }
        (search_box("", state.config.search.debounce_ms))
        (ad(&state, "listing", "/"))
        (tool_list(&tools, "No tools have been published yet."))
    };

    Ok(render(&state, &PageMeta::new("", "/"), None, body))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
}

/// `/search?q=`: the home listing filtered through the search index.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Html<String>, PageError> {
    let query = params.q.trim();
    let debounce = state.config.search.debounce_ms;

    let results = if query.is_empty() {
        let tools = state.store.list_tools(&listing_filter(&state), now()).await?;
        tool_list(&tools, "No tools have been published yet.")
    } else {
        let hits = state.index.query(query, state.config.search.limit).await?;
        hit_list(&hits)
    };

    let title = if query.is_empty() {
        "Search".to_string()
    } else {
        format!("Search results for \"{}\"", query)
    };
    let path = if query.is_empty() {
        "/search".to_string()
    } else {
        search_path(query)
    };

    let body = html! {
        h1 { (title) }
        (search_box(query, debounce))
        (results)
    };

    Ok(render(&state, &PageMeta::new(title.as_str(), path), None, body))
}

/// `/search?q=...` with the query percent-encoded.
fn search_path(query: &str) -> String {
    format!("/search?q={}", urlencoding::encode(query))
}

// ============ Tools ============

pub async fn tool(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, PageError> {
    let now = now();
    let payload = state
        .store
        .find_tool(&slug)
        .await?
        .filter(|p| p.tool.is_published(now))
        .ok_or(PageError::NotFound)?;
    let tool = &payload.tool;
    let path = format!("/tools/{}", tool.slug);

    let candidates = match payload.categories.first() {
        Some(category) => {
            let filter = ToolFilter {
                category: Some(category.slug.clone()),
                ..ToolFilter::published()
            };
            state.store.list_tools(&filter, now).await?
        }
        None => Vec::new(),
    };
    let related = related_tools(&candidates, &tool.slug, state.config.listing.related);

    let trail = Breadcrumbs::new()
        .push("Tools", "/search")
        .push(tool.name.as_str(), path.as_str());

    let body = html! {
        article.tool {
            h1 { (tool.name) }
            @if let Some(ref description) = tool.description {
                p.lead { (description) }
            }
            (badges(&payload.categories))
            @if !payload.alternatives.is_empty() {
                p {
                    "Open source alternative to "
                    @for (i, alt) in payload.alternatives.iter().enumerate() {
                        @if i > 0 { ", " }
                        a href={ "/alternatives/" (alt.slug) } { (alt.name) }
                    }
                }
            }
            ul.facts {
                li { a href=(tool.website) rel="noopener" { "Website" } }
                @if let Some(ref repository) = tool.repository {
                    li { a href=(repository) rel="noopener" { "Repository" } }
                }
                @if tool.stars > 0 {
                    li { "★ " (tool.stars) " stars" }
                }
                @if let Some(ts) = tool.last_commit_at {
                    li { "Last commit " (format_relative(ts, now)) }
                }
            }
        }
        (ad(&state, "tool", &path))
        @if !related.is_empty() {
            section.related {
                h2 { "Related tools" }
                div.grid {
                    @for p in &related {
                        (tool_card(p))
                    }
                }
            }
        }
    };

    let meta = PageMeta::new(tool.name.as_str(), path.as_str())
        .with_description(tool.description.as_deref());
    Ok(render(&state, &meta, Some(&trail), body))
}

// ============ Alternatives ============

pub async fn alternatives(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let alternatives = state.store.list_alternatives(now()).await?;
    let trail = Breadcrumbs::new().push("Alternatives", "/alternatives");

    let body = html! {
        h1 { "Proprietary software and its open source alternatives" }
        div.grid {
            @if alternatives.is_empty() {
                p.empty { "No alternatives listed yet." }
            }
            @for summary in &alternatives {
                (alternative_card(summary))
            }
        }
    };

    let meta = PageMeta::new("Alternatives", "/alternatives");
    Ok(render(&state, &meta, Some(&trail), body))
}

pub async fn alternative(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, PageError> {
    let payload = state
        .store
        .find_alternative(&slug, now())
        .await?
        .ok_or(PageError::NotFound)?;
    let alt = &payload.alternative;
    let path = format!("/alternatives/{}", alt.slug);

    let top = top_tools(&payload.tools, TOP_TOOLS);
    let ranking = rank_categories(&payload.tools);
    let summary = alternative_summary(&alt.name, top, &ranking);

    let trail = Breadcrumbs::new()
        .push("Alternatives", "/alternatives")
        .push(alt.name.as_str(), path.as_str());

    let body = html! {
        h1 { "Open source alternatives to " (alt.name) }
        @if let Some(ref description) = alt.description {
            p.lead { (description) }
        }
        @if top.is_empty() {
            p.empty {
                "No open source alternatives to " (alt.name) " found yet. "
                a href="/submit" { "Suggest one" }
                "."
            }
        } @else {
            @for sentence in &summary {
                p { (sentence) }
            }
            div class="grid" id="results" {
                @for p in top {
                    (tool_card(p))
                }
            }
            @if !ranking.is_empty() {
                h2 { "Categories" }
                (category_ranking(&ranking))
            }
        }
        (ad(&state, "alternative", &path))
    };

    let description = summary.first().map(String::as_str).or(alt.description.as_deref());
    let meta = PageMeta::new(
        format!("Open source alternatives to {}", alt.name),
        path.as_str(),
    )
    .with_description(description);
    Ok(render(&state, &meta, Some(&trail), body))
}

// ============ Categories ============

pub async fn categories(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let categories = state.store.list_categories(now()).await?;
    let trail = Breadcrumbs::new().push("Categories", "/categories");

    let body = html! {
        h1 { "Categories" }
        div.grid {
            @if categories.is_empty() {
                p.empty { "No categories yet." }
            }
            @for summary in &categories {
                (category_card(summary))
            }
        }
    };

    let meta = PageMeta::new("Categories", "/categories");
    Ok(render(&state, &meta, Some(&trail), body))
}

pub async fn category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, PageError> {
    let category = state
        .store
        .find_category(&slug)
        .await?
        .ok_or(PageError::NotFound)?;
    let filter = ToolFilter {
        category: Some(category.slug.clone()),
        ..listing_filter(&state)
    };
    let now = now();
    let tools = state.store.list_tools(&filter, now).await?;
    let tool_count = state
        .store
        .list_categories(now)
        .await?
        .into_iter()
        .find(|summary| summary.category.id == category.id)
        .map_or(tools.len() as i64, |summary| summary.tool_count);
    let path = format!("/categories/{}", category.slug);
    let label = category.display_label();

    let trail = Breadcrumbs::new()
        .push("Categories", "/categories")
        .push(label, path.as_str());

    let body = html! {
        h1 { "Open source " (label) }
        p.muted { (count_label(tool_count, "tool")) }
        (ad(&state, "category", &path))
        (tool_list(&tools, "No published tools in this category yet."))
    };

    let meta = PageMeta::new(format!("Open source {}", label), path.as_str());
    Ok(render(&state, &meta, Some(&trail), body))
}

// ============ Submissions ============

#[derive(Debug, Default, Deserialize)]
pub struct SubmitParams {
    submitted: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubmitForm {
    pub name: String,
    pub website: String,
    pub description: String,
    pub repository: String,
}

impl SubmitForm {
    /// Submissions are stored unpublished with no ranking weight.
    fn to_input(&self) -> ToolInput {
        ToolInput {
            name: self.name.clone(),
            website: self.website.clone(),
            description: Some(self.description.clone()),
            repository: Some(self.repository.clone()),
            ..Default::default()
        }
    }
}

fn submit_page(form: &SubmitForm, error: Option<&str>, submitted: bool) -> Markup {
    html! {
        h1 { "Submit a tool" }
        p.muted {
            "Know an open source tool that belongs here? "
            "Submissions are reviewed before they are published."
        }
        @if submitted {
            p.notice role="status" { "Thanks! Your submission will be reviewed shortly." }
        }
        @if let Some(message) = error {
            p.error role="alert" { (message) }
        }
        form.record method="post" action="/submit" {
            label for="name" { "Name" }
            input #name type="text" name="name" value=(form.name) required;
            label for="website" { "Website" }
            input #website type="url" name="website" value=(form.website) required;
            label for="repository" { "Repository" }
            input #repository type="url" name="repository" value=(form.repository);
            label for="description" { "Description" }
            textarea #description name="description" rows="3" { (form.description) }
            p { button type="submit" { "Submit" } }
        }
    }
}

pub async fn submit_form(
    State(state): State<AppState>,
    Query(params): Query<SubmitParams>,
) -> Html<String> {
    let trail = Breadcrumbs::new().push("Submit", "/submit");
    let body = submit_page(&SubmitForm::default(), None, params.submitted.is_some());
    render(&state, &PageMeta::new("Submit a tool", "/submit"), Some(&trail), body)
}

pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<SubmitForm>,
) -> Result<Response, PageError> {
    match state.store.create_tool(&form.to_input()).await {
        Ok(tool) => {
            tracing::info!(slug = %tool.slug, "tool submitted");
            Ok(Redirect::to("/submit?submitted=1").into_response())
        }
        Err(e) if ValidationError::is_validation(&e) => {
            let trail = Breadcrumbs::new().push("Submit", "/submit");
            let body = submit_page(&form, Some(e.to_string().as_str()), false);
            let meta = PageMeta::new("Submit a tool", "/submit");
            let page = render(&state, &meta, Some(&trail), body);
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// ============ Fallback ============

pub async fn not_found(uri: Uri) -> PageError {
    tracing::debug!(path = %uri.path(), "no route");
    PageError::NotFound
}
