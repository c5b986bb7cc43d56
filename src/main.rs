//! # OpenAlt CLI (`openalt`)
//!
//! The `openalt` binary initializes and seeds the catalog database, queries
//! the search index, rebuilds it, and runs the web server.
//!
//! ## Usage
//!
//! ```bash
//! openalt --config ./config/openalt.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `openalt init` | Create the SQLite database and run schema migrations |
//! | `openalt seed <file>` | Import a JSON catalog, upserting by slug |
//! | `openalt export` | Write the catalog as JSON in the seed format |
//! | `openalt search "<query>"` | Query the configured search index |
//! | `openalt search --interactive` | Debounced search driven by stdin lines |
//! | `openalt index rebuild` | Rebuild the local or hosted search index |
//! | `openalt stats` | Catalog counts and top categories |
//! | `openalt serve` | Start the web server |
//! | `openalt completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! openalt init --config ./config/openalt.toml
//!
//! # Import the example catalog
//! openalt seed data/seed.example.json
//!
//! # One-shot search
//! openalt search "design tool" --limit 5
//!
//! # Start the server with debug logging
//! RUST_LOG=openalt=debug openalt serve
//! ```

use anyhow::bail;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use openalt::{config, export, migrate, search, search_box, seed, server, stats};

/// OpenAlt: a curated directory of open source alternatives.
///
/// All commands except `completions` read a TOML configuration file given
/// by `--config`. See `config/openalt.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "openalt",
    about = "OpenAlt: a curated directory of open source alternatives to proprietary software",
    version,
    long_about = "OpenAlt serves a catalog of open source tools, the proprietary software they \
    replace and the categories that classify them, with admin CRUD, a debounced search box \
    over a local or hosted index, and SEO, sitemap and analytics glue."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/openalt.toml`.
    #[arg(long, global = true, default_value = "./config/openalt.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file, the catalog tables and the
    /// `tools_fts` search table. Running it again is safe.
    Init,

    /// Import a JSON catalog file.
    ///
    /// Categories, alternatives and tools are matched by slug: existing
    /// records are updated, new ones created. Tools reference categories
    /// and alternatives by slug.
    Seed {
        /// Path to the JSON seed file.
        file: PathBuf,
    },

    /// Export the catalog as JSON in the seed format.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Search published tools.
    ///
    /// With `--interactive`, each stdin line replaces the search text and
    /// a query runs once input has been quiet for `search.debounce_ms`.
    /// Type `/reset` to clear the search.
    Search {
        /// Search text (omit with --interactive).
        query: Option<String>,

        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,

        /// Read keystroke snapshots from stdin.
        #[arg(long, short)]
        interactive: bool,
    },

    /// Manage the search index.
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },

    /// Show catalog statistics.
    Stats,

    /// Start the web server on `[server].bind`.
    Serve,

    /// Print shell completions to stdout.
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum IndexAction {
    /// Rebuild the index from the published catalog.
    ///
    /// The local FTS5 table is repopulated; a hosted index is cleared and
    /// every published tool pushed again.
    Rebuild,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "openalt", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Seed { file } => {
            seed::run_seed(&cfg, &file).await?;
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
        Commands::Search {
            query,
            limit,
            interactive,
        } => match (interactive, query) {
            (true, None) => search_box::run_interactive(&cfg).await?,
            (true, Some(_)) => {
                bail!("--interactive reads queries from stdin; drop the query argument")
            }
            (false, Some(query)) => search::run_search(&cfg, &query, limit).await?,
            (false, None) => bail!("a query is required unless --interactive is given"),
        },
        Commands::Index { action } => match action {
            IndexAction::Rebuild => {
                search::rebuild_index(&cfg).await?;
            }
        },
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
