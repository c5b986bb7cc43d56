//! TOML configuration parsing and validation.
//!
//! OpenAlt is configured via a single TOML file (default:
//! `config/openalt.toml`). Every section except `[db]` and `[server]` has
//! defaults; see `config/openalt.example.toml` for a full example.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    /// Admin routes are only mounted when this section is present.
    #[serde(default)]
    pub admin: Option<AdminConfig>,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub ads: Vec<AdConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,
    /// Public base URL, used for canonical links, JSON-LD and the sitemap.
    #[serde(default = "default_site_url")]
    pub url: String,
    #[serde(default = "default_tagline")]
    pub tagline: String,
    #[serde(default = "default_site_description")]
    pub description: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            url: default_site_url(),
            tagline: default_tagline(),
            description: default_site_description(),
        }
    }
}

fn default_site_name() -> String {
    "OpenAlt".to_string()
}
fn default_site_url() -> String {
    "http://localhost:7340".to_string()
}
fn default_tagline() -> String {
    "Open source alternatives to popular software".to_string()
}
fn default_site_description() -> String {
    "A curated collection of the best open source alternatives to everyday SaaS products."
        .to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// `local` (SQLite FTS5) or `hosted` (Algolia-compatible REST API).
    #[serde(default = "default_search_provider")]
    pub provider: String,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
    #[serde(default)]
    pub hosted: Option<HostedSearchConfig>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: default_search_provider(),
            debounce_ms: default_debounce_ms(),
            limit: default_search_limit(),
            hosted: None,
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_search_provider() -> String {
    "local".to_string()
}
fn default_debounce_ms() -> u64 {
    250
}
fn default_search_limit() -> usize {
    24
}

#[derive(Debug, Deserialize, Clone)]
pub struct HostedSearchConfig {
    pub app_id: String,
    pub index: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Overrides `https://{app_id}-dsn.algolia.net`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl HostedSearchConfig {
    pub fn endpoint(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}-dsn.algolia.net", self.app_id),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENALT_SEARCH_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_max_retries() -> u32 {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListingConfig {
    /// Maximum tools shown on listing pages.
    #[serde(default = "default_listing_limit")]
    pub limit: i64,
    /// Related tools shown on a tool page.
    #[serde(default = "default_related")]
    pub related: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            limit: default_listing_limit(),
            related: default_related(),
        }
    }
}

fn default_listing_limit() -> i64 {
    60
}
fn default_related() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    pub username: String,
    /// Hex-encoded SHA-256 of the admin password.
    pub password_sha256: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Collector origin the proxy forwards to.
    #[serde(default = "default_analytics_host")]
    pub host: String,
    /// Site domain reported with each event; defaults to the site URL host.
    #[serde(default)]
    pub domain: Option<String>,
    /// Local path prefix of the proxy routes.
    #[serde(default = "default_analytics_prefix")]
    pub prefix: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_analytics_host(),
            domain: None,
            prefix: default_analytics_prefix(),
        }
    }
}

fn default_analytics_host() -> String {
    "https://plausible.io".to_string()
}
fn default_analytics_prefix() -> String {
    "/_proxy/plausible".to_string()
}

/// A sponsored placement shown in ad slots.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AdConfig {
    pub name: String,
    pub description: String,
    pub website: String,
    /// Slots this ad may appear in; defaults to all of them.
    #[serde(default = "default_ad_slots")]
    pub slots: Vec<String>,
}

/// Slot names pages render ads into.
pub const AD_SLOTS: [&str; 4] = ["listing", "tool", "alternative", "category"];

fn default_ad_slots() -> Vec<String> {
    AD_SLOTS.iter().map(|s| s.to_string()).collect()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(config)
}

/// Check cross-field rules and normalize URLs and prefixes.
pub fn validate(mut config: Config) -> Result<Config> {
    config.site.url = config.site.url.trim_end_matches('/').to_string();
    if !(config.site.url.starts_with("http://") || config.site.url.starts_with("https://")) {
        bail!("site.url must start with http:// or https://");
    }

    match config.search.provider.as_str() {
        "local" => {}
        "hosted" => {
            if config.search.hosted.is_none() {
                bail!("search.provider is 'hosted' but [search.hosted] is missing");
            }
        }
        other => bail!(
            "Unknown search provider: '{}'. Must be local or hosted.",
            other
        ),
    }

    if config.search.debounce_ms == 0 {
        bail!("search.debounce_ms must be > 0");
    }
    if config.search.limit == 0 {
        bail!("search.limit must be > 0");
    }
    if config.listing.limit < 1 {
        bail!("listing.limit must be >= 1");
    }

    if let Some(ref admin) = config.admin {
        if admin.username.trim().is_empty() {
            bail!("admin.username must not be empty");
        }
        let hash = &admin.password_sha256;
        if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("admin.password_sha256 must be 64 hex characters");
        }
    }

    let prefix = config.analytics.prefix.trim_end_matches('/').to_string();
    if !prefix.starts_with('/') || prefix.len() < 2 {
        bail!("analytics.prefix must be an absolute path like /_proxy/plausible");
    }
    config.analytics.prefix = prefix;
    config.analytics.host = config.analytics.host.trim_end_matches('/').to_string();

    for ad in &config.ads {
        for slot in &ad.slots {
            if !AD_SLOTS.contains(&slot.as_str()) {
                bail!(
                    "Unknown ad slot '{}' for ad '{}'. Must be one of: {}",
                    slot,
                    ad.name,
                    AD_SLOTS.join(", ")
                );
            }
        }
    }

    Ok(config)
}
