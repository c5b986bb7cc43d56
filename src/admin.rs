//! Admin CRUD interface.
//!
//! Mounted under `/admin` only when `[admin]` is configured. Every route is
//! guarded by HTTP Basic authentication against `admin.username` and the
//! SHA-256 hex digest in `admin.password_sha256`.
//!
//! # Routes
//!
//! For each `{kind}` of `tools`, `alternatives` and `categories`:
//!
//! | Method | Path | Result |
//! |--------|------|--------|
//! | `GET`  | `/admin` | Dashboard with counts |
//! | `GET`  | `/admin/{kind}` | Table |
//! | `GET`  | `/admin/{kind}/new` | Empty form |
//! | `POST` | `/admin/{kind}` | Create, 303 to the table |
//! | `GET`  | `/admin/{kind}/{id}/edit` | Filled form |
//! | `POST` | `/admin/{kind}/{id}` | Update, 303 to the table |
//! | `POST` | `/admin/{kind}/{id}/delete` | Delete, 303 to the table |
//!
//! Invalid input re-renders the form with status 400 and the error
//! message. Unknown ids are 404.

use axum::{
    extract::{Form, Path, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use base64::Engine;
use maud::Markup;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use openalt_core::error::ValidationError;
use openalt_core::models::{AlternativeInput, CategoryInput, ToolFilter, ToolInput, ToolPayload};

use crate::config::AdminConfig;
use crate::dates::{format_date, parse_optional_date};
use crate::server::{AppState, PageError};
use crate::views::{self, admin_layout};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/tools", get(list_tools).post(create_tool))
        .route("/tools/new", get(new_tool))
        .route("/tools/{id}", post(update_tool))
        .route("/tools/{id}/edit", get(edit_tool))
        .route("/tools/{id}/delete", post(delete_tool))
        .route("/alternatives", get(list_alternatives).post(create_alternative))
        .route("/alternatives/new", get(new_alternative))
        .route("/alternatives/{id}", post(update_alternative))
        .route("/alternatives/{id}/edit", get(edit_alternative))
        .route("/alternatives/{id}/delete", post(delete_alternative))
        .route("/categories", get(list_categories).post(create_category))
        .route("/categories/new", get(new_category))
        .route("/categories/{id}", post(update_category))
        .route("/categories/{id}/edit", get(edit_category))
        .route("/categories/{id}/delete", post(delete_category))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

// ============ Authentication ============

/// Check `Authorization: Basic ...` against the admin credentials.
pub fn check_basic_auth(headers: &HeaderMap, admin: &AdminConfig) -> bool {
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let Some(encoded) = value.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(credentials) = String::from_utf8(decoded) else {
        return false;
    };
    let Some((username, password)) = credentials.split_once(':') else {
        return false;
    };

    let digest = hex::encode(Sha256::digest(password.as_bytes()));
    username == admin.username && digest.eq_ignore_ascii_case(&admin.password_sha256)
}

async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = state
        .config
        .admin
        .as_ref()
        .is_some_and(|admin| check_basic_auth(request.headers(), admin));

    if !authorized {
        tracing::debug!(path = %request.uri().path(), "admin request without valid credentials");
        let mut response = (StatusCode::UNAUTHORIZED, "Authentication required").into_response();
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Basic realm=\"openalt admin\", charset=\"UTF-8\""),
        );
        return response;
    }

    next.run(request).await
}

// ============ Forms ============

/// Raw tool form fields, kept as submitted so they can be re-rendered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolForm {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub website: String,
    pub repository: String,
    pub score: String,
    pub stars: String,
    pub published_at: String,
    pub last_commit_at: String,
    pub category_ids: Vec<String>,
    pub alternative_ids: Vec<String>,
}

impl ToolForm {
    /// Collect url-encoded pairs; `categories` and `alternatives` repeat.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = ToolForm::default();
        for (key, value) in pairs {
            match key.as_str() {
                "name" => form.name = value,
                "slug" => form.slug = value,
                "description" => form.description = value,
                "website" => form.website = value,
                "repository" => form.repository = value,
                "score" => form.score = value,
                "stars" => form.stars = value,
                "published_at" => form.published_at = value,
                "last_commit_at" => form.last_commit_at = value,
                "categories" => form.category_ids.push(value),
                "alternatives" => form.alternative_ids.push(value),
                _ => {}
            }
        }
        form
    }

    pub fn from_payload(payload: &ToolPayload) -> Self {
        let tool = &payload.tool;
        ToolForm {
            name: tool.name.clone(),
            slug: tool.slug.clone(),
            description: tool.description.clone().unwrap_or_default(),
            website: tool.website.clone(),
            repository: tool.repository.clone().unwrap_or_default(),
            score: tool.score.to_string(),
            stars: tool.stars.to_string(),
            published_at: tool.published_at.map(format_date).unwrap_or_default(),
            last_commit_at: tool.last_commit_at.map(format_date).unwrap_or_default(),
            category_ids: payload.categories.iter().map(|c| c.id.clone()).collect(),
            alternative_ids: payload.alternatives.iter().map(|a| a.id.clone()).collect(),
        }
    }

    pub fn to_input(&self) -> anyhow::Result<ToolInput> {
        Ok(ToolInput {
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: Some(self.description.clone()),
            website: self.website.clone(),
            repository: Some(self.repository.clone()),
            score: parse_number("score", &self.score)?,
            stars: parse_number("stars", &self.stars)?,
            published_at: parse_optional_date(&self.published_at)?,
            last_commit_at: parse_optional_date(&self.last_commit_at)?,
            category_ids: self.category_ids.clone(),
            alternative_ids: self.alternative_ids.clone(),
        })
    }
}

fn parse_number(field: &'static str, value: &str) -> anyhow::Result<i64> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse()
        .map_err(|_| ValidationError::Number { field }.into())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AlternativeForm {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub website: String,
}

impl AlternativeForm {
    fn to_input(&self) -> AlternativeInput {
        AlternativeInput {
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: Some(self.description.clone()),
            website: self.website.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
    pub slug: String,
    pub label: String,
}

impl CategoryForm {
    fn to_input(&self) -> CategoryInput {
        CategoryInput {
            name: self.name.clone(),
            slug: self.slug.clone(),
            label: Some(self.label.clone()),
        }
    }
}

// ============ Responses ============

fn page(state: &AppState, title: &str, body: Markup) -> Html<String> {
    Html(admin_layout(&state.config, title, body).into_string())
}

fn invalid(state: &AppState, title: &str, body: Markup) -> Response {
    (StatusCode::BAD_REQUEST, page(state, title, body)).into_response()
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

async fn dashboard(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let counts = state.store.counts(now()).await?;
    Ok(page(&state, "Dashboard", views::admin::dashboard(&counts)))
}

// ============ Tools ============

async fn list_tools(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let tools = state.store.list_tools(&ToolFilter::default(), now()).await?;
    Ok(page(&state, "Tools", views::admin::tools_table(&tools, now())))
}

async fn render_tool_form(
    state: &AppState,
    heading: &str,
    action: &str,
    form: &ToolForm,
    error: Option<&str>,
) -> Result<Markup, PageError> {
    let categories = state.store.list_categories(now()).await?;
    let alternatives = state.store.list_alternatives(now()).await?;
    Ok(views::admin::tool_form(
        heading,
        action,
        form,
        &categories,
        &alternatives,
        error,
    ))
}

async fn new_tool(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let body = render_tool_form(&state, "New tool", "/admin/tools", &ToolForm::default(), None)
        .await?;
    Ok(page(&state, "New tool", body))
}

async fn create_tool(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, PageError> {
    let form = ToolForm::from_pairs(pairs);
    let result = match form.to_input() {
        Ok(input) => state.store.create_tool(&input).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(tool) => {
            tracing::info!(slug = %tool.slug, "tool created");
            Ok(Redirect::to("/admin/tools").into_response())
        }
        Err(e) if ValidationError::is_validation(&e) => {
            let body = render_tool_form(
                &state,
                "New tool",
                "/admin/tools",
                &form,
                Some(e.to_string().as_str()),
            )
            .await?;
            Ok(invalid(&state, "New tool", body))
        }
        Err(e) => Err(e.into()),
    }
}

async fn edit_tool(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, PageError> {
    let payload = state
        .store
        .find_tool_by_id(&id)
        .await?
        .ok_or(PageError::NotFound)?;
    let action = format!("/admin/tools/{}", id);
    let heading = format!("Edit {}", payload.tool.name);
    let body = render_tool_form(
        &state,
        &heading,
        &action,
        &ToolForm::from_payload(&payload),
        None,
    )
    .await?;
    Ok(page(&state, &heading, body))
}

async fn update_tool(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, PageError> {
    let form = ToolForm::from_pairs(pairs);
    let result = match form.to_input() {
        Ok(input) => state.store.update_tool(&id, &input).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(Some(tool)) => {
            tracing::info!(slug = %tool.slug, "tool updated");
            Ok(Redirect::to("/admin/tools").into_response())
        }
        Ok(None) => Err(PageError::NotFound),
        Err(e) if ValidationError::is_validation(&e) => {
            let action = format!("/admin/tools/{}", id);
            let message = e.to_string();
            let body = render_tool_form(
                &state,
                "Edit tool",
                &action,
                &form,
                Some(message.as_str()),
            )
            .await?;
            Ok(invalid(&state, "Edit tool", body))
        }
        Err(e) => Err(e.into()),
    }
}

async fn delete_tool(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, PageError> {
    if !state.store.delete_tool(&id).await? {
        return Err(PageError::NotFound);
    }
    tracing::info!(%id, "tool deleted");
    Ok(Redirect::to("/admin/tools"))
}

// ============ Alternatives ============

async fn list_alternatives(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let alternatives = state.store.list_alternatives(now()).await?;
    Ok(page(
        &state,
        "Alternatives",
        views::admin::alternatives_table(&alternatives),
    ))
}

async fn new_alternative(State(state): State<AppState>) -> Html<String> {
    page(
        &state,
        "New alternative",
        views::admin::alternative_form(
            "New alternative",
            "/admin/alternatives",
            &AlternativeForm::default(),
            None,
        ),
    )
}

async fn create_alternative(
    State(state): State<AppState>,
    Form(form): Form<AlternativeForm>,
) -> Result<Response, PageError> {
    match state.store.create_alternative(&form.to_input()).await {
        Ok(alternative) => {
            tracing::info!(slug = %alternative.slug, "alternative created");
            Ok(Redirect::to("/admin/alternatives").into_response())
        }
        Err(e) if ValidationError::is_validation(&e) => {
            let body = views::admin::alternative_form(
                "New alternative",
                "/admin/alternatives",
                &form,
                Some(e.to_string().as_str()),
            );
            Ok(invalid(&state, "New alternative", body))
        }
        Err(e) => Err(e.into()),
    }
}

async fn edit_alternative(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, PageError> {
    let alternative = state
        .store
        .find_alternative_by_id(&id)
        .await?
        .ok_or(PageError::NotFound)?;
    let form = AlternativeForm {
        name: alternative.name.clone(),
        slug: alternative.slug,
        description: alternative.description.unwrap_or_default(),
        website: alternative.website,
    };
    let heading = format!("Edit {}", alternative.name);
    let action = format!("/admin/alternatives/{}", id);
    Ok(page(
        &state,
        &heading,
        views::admin::alternative_form(&heading, &action, &form, None),
    ))
}

async fn update_alternative(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<AlternativeForm>,
) -> Result<Response, PageError> {
    match state.store.update_alternative(&id, &form.to_input()).await {
        Ok(Some(alternative)) => {
            tracing::info!(slug = %alternative.slug, "alternative updated");
            Ok(Redirect::to("/admin/alternatives").into_response())
        }
        Ok(None) => Err(PageError::NotFound),
        Err(e) if ValidationError::is_validation(&e) => {
            let action = format!("/admin/alternatives/{}", id);
            let body = views::admin::alternative_form(
                "Edit alternative",
                &action,
                &form,
                Some(e.to_string().as_str()),
            );
            Ok(invalid(&state, "Edit alternative", body))
        }
        Err(e) => Err(e.into()),
    }
}

async fn delete_alternative(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, PageError> {
    if !state.store.delete_alternative(&id).await? {
        return Err(PageError::NotFound);
    }
    tracing::info!(%id, "alternative deleted");
    Ok(Redirect::to("/admin/alternatives"))
}

// ============ Categories ============

async fn list_categories(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let categories = state.store.list_categories(now()).await?;
    Ok(page(
        &state,
        "Categories",
        views::admin::categories_table(&categories),
    ))
}

async fn new_category(State(state): State<AppState>) -> Html<String> {
    page(
        &state,
        "New category",
        views::admin::category_form(
            "New category",
            "/admin/categories",
            &CategoryForm::default(),
            None,
        ),
    )
}

async fn create_category(
    State(state): State<AppState>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, PageError> {
    match state.store.create_category(&form.to_input()).await {
        Ok(category) => {
            tracing::info!(slug = %category.slug, "category created");
            Ok(Redirect::to("/admin/categories").into_response())
        }
        Err(e) if ValidationError::is_validation(&e) => {
            let body = views::admin::category_form(
                "New category",
                "/admin/categories",
                &form,
                Some(e.to_string().as_str()),
            );
            Ok(invalid(&state, "New category", body))
        }
        Err(e) => Err(e.into()),
    }
}

async fn edit_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, PageError> {
    let category = state
        .store
        .find_category_by_id(&id)
        .await?
        .ok_or(PageError::NotFound)?;
    let form = CategoryForm {
        name: category.name.clone(),
        slug: category.slug,
        label: category.label.unwrap_or_default(),
    };
    let heading = format!("Edit {}", category.name);
    let action = format!("/admin/categories/{}", id);
    Ok(page(
        &state,
        &heading,
        views::admin::category_form(&heading, &action, &form, None),
    ))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<CategoryForm>,
) -> Result<Response, PageError> {
    match state.store.update_category(&id, &form.to_input()).await {
        Ok(Some(category)) => {
            tracing::info!(slug = %category.slug, "category updated");
            Ok(Redirect::to("/admin/categories").into_response())
        }
        Ok(None) => Err(PageError::NotFound),
        Err(e) if ValidationError::is_validation(&e) => {
            let action = format!("/admin/categories/{}", id);
            let body = views::admin::category_form(
                "Edit category",
                &action,
                &form,
                Some(e.to_string().as_str()),
            );
            Ok(invalid(&state, "Edit category", body))
        }
        Err(e) => Err(e.into()),
    }
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, PageError> {
    if !state.store.delete_category(&id).await? {
        return Err(PageError::NotFound);
    }
    tracing::info!(%id, "category deleted");
    Ok(Redirect::to("/admin/categories"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> AdminConfig {
        AdminConfig {
            username: "root".into(),
            password_sha256: hex::encode(Sha256::digest(b"hunter2")),
        }
    }

    fn basic(credentials: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", encoded)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_basic_auth_accepts_matching_credentials() {
        assert!(check_basic_auth(&basic("root:hunter2"), &admin()));
    }

    #[test]
    fn test_basic_auth_rejects_wrong_or_missing() {
        assert!(!check_basic_auth(&basic("root:wrong"), &admin()));
        assert!(!check_basic_auth(&basic("admin:hunter2"), &admin()));
        assert!(!check_basic_auth(&basic("no-colon"), &admin()));
        assert!(!check_basic_auth(&HeaderMap::new(), &admin()));
    }

    #[test]
    fn test_password_may_contain_colon() {
        let admin = AdminConfig {
            username: "root".into(),
            password_sha256: hex::encode(Sha256::digest(b"a:b")),
        };
        assert!(check_basic_auth(&basic("root:a:b"), &admin));
    }

    #[test]
    fn test_tool_form_collects_repeated_fields() {
        let form = ToolForm::from_pairs(vec![
            ("name".into(), "Gitea".into()),
            ("website".into(), "https://gitea.com".into()),
            ("categories".into(), "c1".into()),
            ("categories".into(), "c2".into()),
            ("alternatives".into(), "a1".into()),
            ("published_at".into(), "2024-03-01".into()),
        ]);
        assert_eq!(form.category_ids, vec!["c1", "c2"]);
        let input = form.to_input().unwrap();
        assert_eq!(input.alternative_ids, vec!["a1"]);
        assert_eq!(input.published_at, Some(1709251200));
        assert_eq!(input.score, 0);
    }

    #[test]
    fn test_tool_form_rejects_bad_number_and_date() {
        let mut form = ToolForm {
            score: "lots".into(),
            ..Default::default()
        };
        let err = form.to_input().unwrap_err();
        assert!(ValidationError::is_validation(&err));

        form.score = "1".into();
        form.published_at = "yesterday".into();
        let err = form.to_input().unwrap_err();
        assert!(ValidationError::is_validation(&err));
    }
}
