//! Search-box interaction state and the search index abstraction.
//!
//! [`SearchBox`] models the text input bound to a search index: it holds
//! the local text, coalesces keystrokes until the input has been quiet for
//! a fixed period, and tracks whether a submitted query is still in flight.
//! It owns no timers. A driver feeds it the current instant and sleeps
//! until [`SearchBox::deadline`].
//!
//! # Lifecycle
//!
//! ```text
//!  input("r") ─┐
//!  input("ru") ├─ deadline re-armed on every keystroke
//!  input("rust")┘
//!        │ 250 ms quiet
//!        ▼
//!  poll(now) → Submission { seq: 1, query: "rust" }   (stalled)
//!        │
//!        ▼
//!  complete(1) → true                                  (idle)
//! ```
//!
//! Only the most recent submission is current: completing an older
//! sequence number returns `false` and its results must be dropped.

use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Quiet period after the last keystroke before a query is submitted.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(250);

/// A query emitted by the search box, tagged with its submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub seq: u64,
    pub query: String,
}

/// Local state of a debounced search input.
#[derive(Debug, Clone)]
pub struct SearchBox {
    quiet: Duration,
    text: String,
    deadline: Option<Instant>,
    last_seq: u64,
    in_flight: Option<u64>,
}

impl Default for SearchBox {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl SearchBox {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            text: String::new(),
            deadline: None,
            last_seq: 0,
            in_flight: None,
        }
    }

    /// Current text of the input.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the input text and re-arm the submission deadline.
    pub fn input(&mut self, text: impl Into<String>, now: Instant) {
        self.text = text.into();
        self.deadline = Some(now + self.quiet);
    }

    /// Instant at which the pending text becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Emit the pending text once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Submission> {
        match self.deadline {
            Some(due) if due <= now => {
                self.deadline = None;
                Some(self.submit())
            }
            _ => None,
        }
    }

    /// Clear the text and immediately submit the empty query.
    pub fn reset(&mut self) -> Submission {
        self.text.clear();
        self.deadline = None;
        self.submit()
    }

    /// Mark a submission as finished.
    ///
    /// Returns `true` if `seq` is the latest submission, i.e. its results
    /// should be displayed.
    pub fn complete(&mut self, seq: u64) -> bool {
        if seq != self.last_seq {
            return false;
        }
        if self.in_flight == Some(seq) {
            self.in_flight = None;
        }
        true
    }

    /// True while the latest submission has not completed.
    pub fn is_stalled(&self) -> bool {
        self.in_flight.is_some()
    }

    fn submit(&mut self) -> Submission {
        self.last_seq += 1;
        self.in_flight = Some(self.last_seq);
        Submission {
            seq: self.last_seq,
            query: self.text.clone(),
        }
    }
}

/// A ranked search result returned by a [`SearchIndex`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub website: String,
    #[serde(default)]
    pub score: i64,
}

/// A text index over the catalog's tools.
///
/// Implementations aim to return published tools only, but may lag behind
/// the store; the application checks hits before showing them.
///
/// An empty (or whitespace-only) query clears filtering: implementations
/// return the unfiltered listing rather than an error.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Short identifier for logs (`"local"`, `"hosted"`).
    fn name(&self) -> &str;

    /// Return up to `limit` hits for `query`, best first.
    async fn query(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_nothing_submitted_before_quiet_period() {
        let t0 = Instant::now();
        let mut sb = SearchBox::default();
        sb.input("r", t0);
        assert_eq!(sb.poll(t0 + ms(249)), None);
        assert!(!sb.is_stalled());
        assert_eq!(
            sb.poll(t0 + ms(250)),
            Some(Submission {
                seq: 1,
                query: "r".into()
            })
        );
        assert!(sb.is_stalled());
    }

    #[test]
    fn test_rapid_typing_coalesces() {
        let t0 = Instant::now();
        let mut sb = SearchBox::default();
        let mut submitted = Vec::new();

        for (i, text) in ["r", "ru", "rus", "rust"].iter().enumerate() {
            let now = t0 + ms(100 * i as u64);
            if let Some(s) = sb.poll(now) {
                submitted.push(s.query);
            }
            sb.input(*text, now);
        }
        // keystrokes 100ms apart never let the deadline pass
        assert!(submitted.is_empty());
        assert_eq!(sb.deadline(), Some(t0 + ms(300) + SEARCH_DEBOUNCE));

        let s = sb.poll(t0 + ms(600)).unwrap();
        assert_eq!(s.query, "rust");
        assert_eq!(sb.poll(t0 + ms(2000)), None);
    }

    #[test]
    fn test_reset_submits_empty_query_immediately() {
        let t0 = Instant::now();
        let mut sb = SearchBox::default();
        sb.input("gimp", t0);
        let s = sb.reset();
        assert_eq!(s.query, "");
        assert_eq!(sb.text(), "");
        assert_eq!(sb.deadline(), None);
        assert!(sb.is_stalled());
        // the pending "gimp" submission was cancelled
        assert_eq!(sb.poll(t0 + ms(1000)), None);
    }

    #[test]
    fn test_reset_on_empty_box_still_submits() {
        let mut sb = SearchBox::default();
        assert_eq!(sb.reset().query, "");
        assert_eq!(sb.reset().seq, 2);
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let t0 = Instant::now();
        let mut sb = SearchBox::default();
        sb.input("a", t0);
        let first = sb.poll(t0 + ms(250)).unwrap();
        sb.input("ab", t0 + ms(300));
        let second = sb.poll(t0 + ms(550)).unwrap();

        assert!(!sb.complete(first.seq));
        assert!(sb.is_stalled());
        assert!(sb.complete(second.seq));
        assert!(!sb.is_stalled());
    }

    #[test]
    fn test_custom_quiet_period() {
        let t0 = Instant::now();
        let mut sb = SearchBox::new(ms(10));
        sb.input("x", t0);
        assert!(sb.poll(t0 + ms(10)).is_some());
    }
}
