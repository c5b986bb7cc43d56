//! Async driver for [`SearchBox`] and the `openalt search --interactive`
//! command.
//!
//! The driver owns the effects the state machine leaves out: it sleeps
//! until the debounce deadline, runs each submission as a spawned task and
//! hands completed results back to the box, which drops stale ones.
//!
//! ```text
//!  events ──► select! ─┬─ Input(text)  → box.input(text, now)
//!                      ├─ Reset        → box.reset() → spawn query
//!                      ├─ deadline     → box.poll(now) → spawn query
//!                      └─ task done    → box.complete(seq) → on_update
//! ```
//!
//! When the event channel closes, the driver still fires a pending
//! deadline and waits for in-flight queries before returning.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;

use openalt_core::search::{SearchBox, SearchHit, SearchIndex, Submission};

use crate::config::Config;
use crate::db;
use crate::search::{open_index, print_hits};

/// Input to the search box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// The full current text of the input.
    Input(String),
    Reset,
}

/// What the driver reports back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchUpdate {
    /// A query was submitted; results are pending.
    Stalled { query: String },
    Results { query: String, hits: Vec<SearchHit> },
    Failed { query: String, error: String },
}

type Completion = (u64, String, Result<Vec<SearchHit>>);

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

/// Run the search box until `events` closes and all work has drained.
pub async fn drive<F>(
    index: Arc<dyn SearchIndex>,
    quiet: Duration,
    limit: usize,
    mut events: mpsc::Receiver<SearchEvent>,
    mut on_update: F,
) -> Result<()>
where
    F: FnMut(SearchUpdate),
{
    let mut search_box = SearchBox::new(quiet);
    let mut tasks: JoinSet<Completion> = JoinSet::new();
    let mut open = true;

    let submit = |tasks: &mut JoinSet<Completion>, submission: Submission| {
        let index = index.clone();
        tracing::debug!(seq = submission.seq, query = %submission.query, "search submitted");
        tasks.spawn(async move {
            let result = index.query(&submission.query, limit).await;
            (submission.seq, submission.query, result)
        });
    };

    loop {
        let deadline = search_box.deadline();
        if !open && deadline.is_none() && tasks.is_empty() {
            break;
        }

        let sleep_until = deadline.map(Instant::from_std).unwrap_or_else(Instant::now);

        tokio::select! {
            event = events.recv(), if open => match event {
                Some(SearchEvent::Input(text)) => search_box.input(text, now()),
                Some(SearchEvent::Reset) => {
                    let submission = search_box.reset();
                    on_update(SearchUpdate::Stalled { query: submission.query.clone() });
                    submit(&mut tasks, submission);
                }
                None => open = false,
            },
            _ = tokio::time::sleep_until(sleep_until), if deadline.is_some() => {
                if let Some(submission) = search_box.poll(now()) {
                    on_update(SearchUpdate::Stalled { query: submission.query.clone() });
                    submit(&mut tasks, submission);
                }
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                let (seq, query, result) = joined?;
                if !search_box.complete(seq) {
                    tracing::debug!(seq, "dropping stale search results");
                    continue;
                }
                match result {
                    Ok(hits) => on_update(SearchUpdate::Results { query, hits }),
                    Err(e) => on_update(SearchUpdate::Failed { query, error: e.to_string() }),
                }
            }
        }
    }

    Ok(())
}

/// `openalt search --interactive`: each stdin line replaces the query
/// text, `/reset` clears it, EOF exits.
pub async fn run_interactive(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let index = open_index(config, pool.clone())?;

    if atty::is(atty::Stream::Stdin) {
        println!(
            "Type to search {} ({} index). /reset clears, Ctrl-D exits.",
            config.site.name,
            index.name()
        );
    }

    let (tx, rx) = mpsc::channel(64);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let event = if line.trim() == "/reset" {
                SearchEvent::Reset
            } else {
                SearchEvent::Input(line)
            };
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });

    drive(
        index,
        config.search.debounce(),
        config.search.limit,
        rx,
        |update| match update {
            SearchUpdate::Stalled { query } => println!("… searching \"{}\"", query),
            SearchUpdate::Results { query, hits } => {
                println!("Results for \"{}\":", query);
                print_hits(&hits);
            }
            SearchUpdate::Failed { query, error } => {
                eprintln!("Search for \"{}\" failed: {}", query, error)
            }
        },
    )
    .await?;

    pool.close().await;
    Ok(())
}
