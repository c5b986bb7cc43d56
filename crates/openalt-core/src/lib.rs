//! # OpenAlt Core
//!
//! Shared logic for OpenAlt: catalog models, the store abstraction, the
//! derived display structures used by pages (rankings, top-N slices,
//! summary sentences), and the search-box state machine.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem I/O. Timers and
//! queries are driven by the calling application.

pub mod error;
pub mod models;
pub mod ranking;
pub mod search;
pub mod store;
pub mod summary;
