//! First-party analytics proxy.
//!
//! When `[analytics]` is enabled the collector's script and event endpoint
//! are served from the site's own origin under `analytics.prefix`:
//!
//! | Local route | Upstream |
//! |-------------|----------|
//! | `GET {prefix}/script.js` | `GET {host}/js/script.js` |
//! | `POST {prefix}/event` | `POST {host}/api/event` |
//!
//! The event body and the `content-type`, `user-agent` and
//! `x-forwarded-for` headers are forwarded as-is. Upstream failures answer
//! 502.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use maud::{html, Markup};

use crate::config::Config;
use crate::server::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/script.js", get(handle_script))
        .route("/event", post(handle_event))
}

/// The `<script>` tag the layout embeds when analytics is enabled.
pub fn script_tag(config: &Config) -> Markup {
    let prefix = config.analytics.prefix.trim_end_matches('/');
    html! {
        script defer
            data-domain=(reported_domain(config))
            data-api={ (prefix) "/event" }
            src={ (prefix) "/script.js" } {}
    }
}

/// `analytics.domain`, or the host of the site URL.
pub fn reported_domain(config: &Config) -> String {
    if let Some(ref domain) = config.analytics.domain {
        return domain.clone();
    }
    reqwest::Url::parse(&config.site.url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| config.site.url.clone())
}

fn upstream(config: &Config, path: &str) -> String {
    format!("{}{}", config.analytics.host.trim_end_matches('/'), path)
}

fn bad_gateway(err: reqwest::Error, url: &str) -> Response {
    tracing::warn!(error = %err, %url, "analytics upstream failed");
    (StatusCode::BAD_GATEWAY, "analytics upstream unavailable").into_response()
}

async fn handle_script(State(state): State<AppState>) -> Response {
    let url = upstream(&state.config, "/js/script.js");
    let response = match state.http.get(&url).send().await {
        Ok(r) => r,
        Err(e) => return bad_gateway(e, &url),
    };

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| header::HeaderValue::from_static("application/javascript"));

    match response.bytes().await {
        Ok(body) => (
            status,
            [
                (header::CONTENT_TYPE, content_type),
                (
                    header::CACHE_CONTROL,
                    header::HeaderValue::from_static("public, max-age=86400"),
                ),
            ],
            body,
        )
            .into_response(),
        Err(e) => bad_gateway(e, &url),
    }
}

async fn handle_event(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let url = upstream(&state.config, "/api/event");

    let forwarded = [
        header::CONTENT_TYPE,
        header::USER_AGENT,
        HeaderName::from_static("x-forwarded-for"),
    ];
    let mut request = state.http.post(&url).body(body);
    for name in &forwarded {
        if let Some(value) = headers.get(name) {
            request = request.header(name, value);
        }
    }

    match request.send().await {
        Ok(response) => {
            let status = response.status();
            match response.bytes().await {
                Ok(body) => (status, body).into_response(),
                Err(e) => bad_gateway(e, &url),
            }
        }
        Err(e) => bad_gateway(e, &url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use openalt_core::search::{SearchHit, SearchIndex};
    use openalt_core::store::memory::InMemoryStore;

    struct NoIndex;

    #[async_trait::async_trait]
    impl SearchIndex for NoIndex {
        fn name(&self) -> &str {
            "none"
        }

        async fn query(&self, _query: &str, _limit: usize) -> anyhow::Result<Vec<SearchHit>> {
            Ok(Vec::new())
        }
    }

    fn config(host: &str) -> Config {
        toml::from_str(&format!(
            r#"
            [db]
            path = "unused.sqlite"

            [server]
            bind = "127.0.0.1:0"

            [site]
            url = "https://openalt.example.org"

            [analytics]
            enabled = true
            host = "{}"
            prefix = "/_a"
            "#,
            host
        ))
        .unwrap()
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn spawn_proxy(host: &str) -> String {
        let state = AppState::new(
            config(host),
            Arc::new(InMemoryStore::new()),
            Arc::new(NoIndex),
        )
        .unwrap();
        spawn(Router::new().nest("/_a", routes()).with_state(state)).await
    }

    #[test]
    fn test_script_tag_points_at_proxy() {
        let html = script_tag(&config("https://plausible.io")).into_string();
        assert!(html.contains("src=\"/_a/script.js\""));
        assert!(html.contains("data-api=\"/_a/event\""));
        assert!(html.contains("data-domain=\"openalt.example.org\""));
    }

    #[test]
    fn test_configured_domain_wins() {
        let mut config = config("https://plausible.io");
        config.analytics.domain = Some("stats.example.org".into());
        assert_eq!(reported_domain(&config), "stats.example.org");
    }

    #[tokio::test]
    async fn test_event_forwards_body_and_headers() {
        let seen: Arc<Mutex<Option<(String, String)>>> = Arc::new(Mutex::new(None));
        let record = seen.clone();
        let upstream = spawn(Router::new().route(
            "/api/event",
            post(move |headers: HeaderMap, body: String| {
                let record = record.clone();
                async move {
                    let agent = headers
                        .get(header::USER_AGENT)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    *record.lock().unwrap() = Some((agent, body));
                    (StatusCode::ACCEPTED, "ok")
                }
            }),
        ))
        .await;
        let proxy = spawn_proxy(&upstream).await;

        let resp = reqwest::Client::new()
            .post(format!("{}/_a/event", proxy))
            .header("user-agent", "test-agent")
            .header("content-type", "text/plain")
            .body("{\"n\":\"pageview\"}")
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status().as_u16(), 202);
        let (agent, body) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(agent, "test-agent");
        assert_eq!(body, "{\"n\":\"pageview\"}");
    }

    #[tokio::test]
    async fn test_script_proxied() {
        let upstream = spawn(Router::new().route(
            "/js/script.js",
            get(|| async { ([(header::CONTENT_TYPE, "application/javascript")], "track()") }),
        ))
        .await;
        let proxy = spawn_proxy(&upstream).await;

        let resp = reqwest::get(format!("{}/_a/script.js", proxy)).await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(resp.text().await.unwrap(), "track()");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_bad_gateway() {
        // nothing listens on port 9 locally
        let proxy = spawn_proxy("http://127.0.0.1:9").await;
        let resp = reqwest::get(format!("{}/_a/script.js", proxy)).await.unwrap();
        assert_eq!(resp.status().as_u16(), 502);
    }
}
