//! Server-side HTML rendering with maud.
//!
//! Views are stateless functions from data to [`Markup`]. Page handlers in
//! [`crate::pages`] and [`crate::admin`] fetch data, then hand it to these
//! functions; nothing here touches the store.
//!
//! | Module | Contents |
//! |--------|----------|
//! | (this) | Document layouts |
//! | [`components`] | Cards, badges, lists, ad slot |
//! | [`search_box`] | Search input and its browser script |
//! | [`admin`] | Admin tables and forms |

pub mod admin;
pub mod components;
pub mod search_box;

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::analytics;
use crate::breadcrumbs::Breadcrumbs;
use crate::config::Config;
use crate::seo::PageMeta;

const STYLE: &str = r#"
:root { --fg: #1d232a; --muted: #5b6572; --line: #e3e7ec; --accent: #0a7c5a; }
* { box-sizing: border-box; }
body { margin: 0; font: 16px/1.5 system-ui, sans-serif; color: var(--fg); }
a { color: var(--accent); }
header.site, footer.site { padding: 1rem 2rem; border-bottom: 1px solid var(--line); }
footer.site { border-top: 1px solid var(--line); border-bottom: 0; color: var(--muted); }
header.site nav { display: flex; gap: 1.25rem; align-items: baseline; }
header.site .brand { font-weight: 700; font-size: 1.2rem; text-decoration: none; }
main { max-width: 72rem; margin: 0 auto; padding: 1.5rem 2rem; }
.breadcrumbs ol { list-style: none; display: flex; gap: .5rem; padding: 0; color: var(--muted); }
.breadcrumbs li + li::before { content: "›"; margin-right: .5rem; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(16rem, 1fr)); gap: 1rem; }
.card { border: 1px solid var(--line); border-radius: .5rem; padding: 1rem; }
.card h3 { margin: 0 0 .25rem; }
.badges { list-style: none; display: flex; flex-wrap: wrap; gap: .35rem; padding: 0; }
.badge { font-size: .8rem; padding: .1rem .5rem; border-radius: 1rem; background: #eef5f2; text-decoration: none; }
.muted, .empty { color: var(--muted); }
.ad { border: 1px dashed var(--line); border-radius: .5rem; padding: .75rem 1rem; margin: 1.5rem 0; }
.ad-label { font-size: .7rem; text-transform: uppercase; color: var(--muted); }
.error { color: #a3261b; }
form.search { display: flex; gap: .5rem; margin-bottom: 1.5rem; }
form.search input { flex: 1; padding: .5rem .75rem; font-size: 1rem; }
table { border-collapse: collapse; width: 100%; }
th, td { text-align: left; padding: .4rem .6rem; border-bottom: 1px solid var(--line); }
form.record label { display: block; margin-top: .75rem; font-weight: 600; }
form.record input[type=text], form.record input[type=url], form.record input[type=date],
form.record input[type=number], form.record textarea { width: 100%; padding: .4rem; }
"#;

fn head(config: &Config, meta: &PageMeta) -> Markup {
    html! {
        meta charset="utf-8";
        meta name="viewport" content="width=device-width, initial-scale=1";
        (meta.render(&config.site))
        style { (PreEscaped(STYLE)) }
        @if config.analytics.enabled {
            (analytics::script_tag(config))
        }
    }
}

/// Public page layout: header navigation, optional breadcrumbs, footer.
pub fn layout(
    config: &Config,
    meta: &PageMeta,
    breadcrumbs: Option<&Breadcrumbs>,
    body: Markup,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head { (head(config, meta)) }
            body {
                header.site {
                    nav {
                        a.brand href="/" { (config.site.name) }
                        a href="/" { "Tools" }
                        a href="/alternatives" { "Alternatives" }
                        a href="/categories" { "Categories" }
                        a href="/submit" { "Submit a tool" }
                    }
                }
                main {
                    @if let Some(trail) = breadcrumbs {
                        (trail.render(&config.site.url))
                    }
                    (body)
                }
                footer.site {
                    p { (config.site.name) " – " (config.site.tagline) }
                }
            }
        }
    }
}

/// Admin layout: never indexed, no analytics.
pub fn admin_layout(config: &Config, title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="robots" content="noindex, nofollow";
                title { (title) " – " (config.site.name) " admin" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                header.site {
                    nav {
                        a.brand href="/admin" { (config.site.name) " admin" }
                        a href="/admin/tools" { "Tools" }
                        a href="/admin/alternatives" { "Alternatives" }
                        a href="/admin/categories" { "Categories" }
                        a href="/" { "View site" }
                    }
                }
                main { (body) }
            }
        }
    }
}
