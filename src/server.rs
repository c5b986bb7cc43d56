//! HTTP server: public pages, JSON API, admin and analytics proxy.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Published tools by score |
//! | `GET`  | `/search?q=` | Tools filtered through the search index |
//! | `GET`  | `/tools/{slug}` | Tool detail |
//! | `GET`  | `/alternatives`, `/alternatives/{slug}` | Alternative listing and detail |
//! | `GET`  | `/categories`, `/categories/{slug}` | Category listing and detail |
//! | `GET`/`POST` | `/submit` | Public tool submission |
//! | `GET`  | `/api/search?q=&limit=` | JSON search used by the search box |
//! | `GET`  | `/sitemap.xml`, `/robots.txt` | Crawler metadata |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `*`    | `/admin/...` | Admin CRUD, only when `[admin]` is configured |
//! | `*`    | `{analytics.prefix}/...` | Analytics proxy, only when enabled |
//!
//! # Error Contract
//!
//! HTML routes answer with an HTML error page. JSON routes use:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "limit must be between 1 and 100" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `search_error` (502).
//!
//! # CORS
//!
//! Only `/api` routes allow cross-origin requests.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use maud::html;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use openalt_core::search::{SearchHit, SearchIndex};
use openalt_core::store::CatalogStore;

use crate::config::Config;
use crate::search::CheckedIndex;
use crate::sqlite_store::SqliteStore;
use crate::{admin, analytics, db, migrate, pages, search, sitemap};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn CatalogStore>,
    pub index: Arc<dyn SearchIndex>,
    /// Outbound client for the analytics proxy.
    pub http: reqwest::Client,
}

impl AppState {
    /// Search hits from `index` are checked against `store` before use.
    pub fn new(
        config: Config,
        store: Arc<dyn CatalogStore>,
        index: Arc<dyn SearchIndex>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        let index: Arc<dyn SearchIndex> = Arc::new(CheckedIndex::new(index, store.clone()));
        Ok(Self {
            config: Arc::new(config),
            store,
            index,
            http,
        })
    }
}

/// Starts the HTTP server.
///
/// Applies migrations, then binds to `[server].bind` and serves until
/// Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;

    let index = search::create_index(config, pool.clone())?;
    let store: Arc<dyn CatalogStore> = Arc::new(SqliteStore::new(pool));
    let state = AppState::new(config.clone(), store, index)?;

    let app = build_router(state);

    println!("{} listening on http://{}", config.site.name, bind_addr);
    if config.admin.is_some() {
        println!("  admin:     http://{}/admin", bind_addr);
    }
    if config.analytics.enabled {
        println!(
            "  analytics: {} -> {}",
            config.analytics.prefix, config.analytics.host
        );
    }
    tracing::info!(bind = %bind_addr, search = %config.search.provider, "server started");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
}

/// Assemble every route over `state`.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/search", get(handle_api_search))
        .fallback(handle_api_not_found)
        .layer(cors);

    let mut app = Router::new()
        .route("/", get(pages::home))
        .route("/search", get(pages::search))
        .route("/tools/{slug}", get(pages::tool))
        .route("/alternatives", get(pages::alternatives))
        .route("/alternatives/{slug}", get(pages::alternative))
        .route("/categories", get(pages::categories))
        .route("/categories/{slug}", get(pages::category))
        .route("/submit", get(pages::submit_form).post(pages::submit))
        .route("/sitemap.xml", get(sitemap::handle_sitemap))
        .route("/robots.txt", get(sitemap::handle_robots))
        .route("/health", get(handle_health))
        .nest("/api", api);

    if state.config.admin.is_some() {
        app = app.nest("/admin", admin::routes(state.clone()));
    }

    if state.config.analytics.enabled {
        app = app.nest(&state.config.analytics.prefix, analytics::routes());
    }

    app.fallback(pages::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============ Error responses ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Error type of JSON routes.
pub struct ApiError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn search_error(message: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::BAD_GATEWAY,
        code: "search_error".to_string(),
        message: message.into(),
    }
}

/// Error type of HTML routes.
///
/// Internal errors are logged; the response never includes their message.
#[derive(Debug)]
pub enum PageError {
    NotFound,
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for PageError {
    fn from(err: anyhow::Error) -> Self {
        PageError::Internal(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, title, message) = match self {
            PageError::NotFound => (
                StatusCode::NOT_FOUND,
                "Page not found",
                "The page you are looking for does not exist or is not published yet.",
            ),
            PageError::Internal(err) => {
                tracing::error!(error = %format!("{:#}", err), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong",
                    "An unexpected error occurred. Please try again later.",
                )
            }
        };

        let body = html! {
            (maud::DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="robots" content="noindex";
                    title { (title) }
                }
                body {
                    main.error-page {
                        h1 { (title) }
                        p { (message) }
                        p { a href="/" { "Back to the homepage" } }
                    }
                }
            }
        };

        (status, Html(body.into_string())).into_response()
    }
}

// ============ GET /health ============

/// JSON response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/search ============

async fn handle_api_not_found(uri: axum::http::Uri) -> ApiError {
    not_found(format!("no API route for {}", uri.path()))
}

#[derive(Deserialize)]
pub struct ApiSearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ApiSearchResponse {
    query: String,
    provider: String,
    hits: Vec<SearchHit>,
}

/// Handler for `GET /api/search`.
///
/// An empty `q` returns the unfiltered published listing. A malformed
/// query string is a JSON `bad_request`, not axum's plain-text rejection.
async fn handle_api_search(
    State(state): State<AppState>,
    params: Result<Query<ApiSearchParams>, QueryRejection>,
) -> Result<Json<ApiSearchResponse>, ApiError> {
    let Query(params) = params.map_err(|rejection| bad_request(rejection.body_text()))?;
    let limit = params.limit.unwrap_or(state.config.search.limit);
    if limit == 0 || limit > 100 {
        return Err(bad_request("limit must be between 1 and 100"));
    }

    let query = params.q.trim().to_string();
    let hits = state.index.query(&query, limit).await.map_err(|e| {
        tracing::warn!(error = %e, index = state.index.name(), "search failed");
        search_error(e.to_string())
    })?;

    Ok(Json(ApiSearchResponse {
        query,
        provider: state.index.name().to_string(),
        hits,
    }))
}
