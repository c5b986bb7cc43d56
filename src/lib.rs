//! # OpenAlt
//!
//! A curated directory of open source tools, the proprietary software they
//! replace, and the categories that classify them.
//!
//! OpenAlt renders server-side HTML listing and detail pages from a SQLite
//! catalog, serves an admin CRUD interface, and filters listings through a
//! search index (local FTS5 or a hosted Algolia-compatible service) driven
//! by a debounced search box.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌──────────┐   ┌──────────┐
//! │  SQLite  │──▶│ CatalogStore │──▶│  Pages   │──▶│  maud    │
//! │ + FTS5   │   │  (queries)   │   │ (derive) │   │  views   │
//! └────┬─────┘   └─────────────┘   └──────────┘   └──────────┘
//!      │
//!      ▼
//! ┌──────────┐   ┌─────────────┐
//! │  Search  │◀──│  SearchBox  │◀── keystrokes (browser / CLI)
//! │  index   │   │ (debounce)  │
//! └──────────┘   └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! openalt init                          # create database
//! openalt seed data/seed.example.json   # import a catalog
//! openalt search "git"                  # query the index
//! openalt serve                         # start the web server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite implementation of the catalog store |
//! | [`search`] | Local and hosted search indexes |
//! | [`search_box`] | Interactive debounced search driver |
//! | [`seed`] / [`export`] | JSON catalog import and export |
//! | [`stats`] | Catalog statistics |
//! | [`server`] | HTTP server, routing, error responses |
//! | [`pages`] | Public page composition |
//! | [`admin`] | Admin CRUD behind Basic auth |
//! | [`views`] | maud layouts and components |
//! | [`seo`], [`breadcrumbs`] | Page metadata and JSON-LD |
//! | [`ads`] | Ad slot selection |
//! | [`analytics`] | Analytics proxy |
//! | [`sitemap`] | `sitemap.xml` and `robots.txt` |
//! | [`dates`] | Timestamp parsing and formatting |

pub mod admin;
pub mod ads;
pub mod analytics;
pub mod breadcrumbs;
pub mod config;
pub mod dates;
pub mod db;
pub mod export;
pub mod migrate;
pub mod pages;
pub mod search;
pub mod search_box;
pub mod seed;
pub mod seo;
pub mod server;
pub mod sitemap;
pub mod sqlite_store;
pub mod stats;
pub mod views;
