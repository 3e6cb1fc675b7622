//! # pubcat CLI
//!
//! ## Usage
//!
//! ```bash
//! pubcat [--config ./config/pubcat.toml] [--quiet] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `pubcat fetch` | Download and normalize the Zenodo community's records |
//! | `pubcat build-index` | Build the static search artifact from the records file |
//! | `pubcat search "<query>"` | Query a built or deployed search artifact |
//! | `pubcat browse` | Filter, sort and paginate the report catalog |
//! | `pubcat get <id>` | Show one record, or its JSON-LD |
//! | `pubcat cite <id>` | Format a citation for one record |
//! | `pubcat stats` | Summarize a built search artifact |
//!
//! Diagnostics go to stderr (`RUST_LOG` controls verbosity); command output
//! goes to stdout.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pubcat::{browse_cmd, cite, config, connector_zenodo, get, index_cmd, query, stats};

/// pubcat: publication catalog tooling for a static report site.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Without it, `./config/pubcat.toml` is read when present and
/// built-in defaults are used otherwise.
#[derive(Parser)]
#[command(
    name = "pubcat",
    about = "pubcat: Zenodo fetch, static search index, query engine, and catalog browsing",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only log warnings and errors.
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Fetch every record of the configured Zenodo community.
    ///
    /// Pages through the Zenodo records API, normalizes each hit and
    /// writes the records as JSON to `paths.records`. Set `ZENODO_TOKEN`
    /// to use page sizes above 25.
    Fetch,

    /// Build the static search artifact.
    ///
    /// Reads the records file and writes `{generatedAt, index, docs}` to
    /// the output path in one atomic replace. Missing or malformed input
    /// aborts without touching the output.
    BuildIndex {
        /// Records file (defaults to `paths.records`).
        #[arg(long)]
        input: Option<PathBuf>,

        /// Artifact path (defaults to `paths.index_output`).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Search the artifact.
    ///
    /// Every query term must appear in a document; matches in the title,
    /// keywords and creators rank higher. At most 24 results are shown.
    Search {
        /// The search query string.
        query: String,

        /// Artifact file path or http(s) URL. Defaults to the deployed
        /// site when `site.base_url` is set, else `paths.index_output`.
        #[arg(long)]
        index: Option<String>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Browse the report catalog.
    ///
    /// Starts from a URL query string (`q`, `category`, `sort`, `page`,
    /// `size`), applies each `--then` action in order, and prints the
    /// resulting page with its shareable URL.
    Browse {
        /// Initial state as a URL query string, e.g. `category=policy&page=2`.
        #[arg(long)]
        state: Option<String>,

        /// Action to apply: `prev`, `next`, `q=<text>`, `category=<name>`,
        /// `sort=<order>` or `size=<n>`. Repeatable.
        #[arg(long = "then")]
        then: Vec<String>,

        /// Catalog page path used for the printed URL.
        #[arg(long)]
        path: Option<String>,

        /// Print the rendered frame as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a record by id (`987` or `zenodo-987`).
    Get {
        /// Record id.
        id: String,

        /// Print schema.org JSON-LD instead of the summary.
        #[arg(long)]
        jsonld: bool,
    },

    /// Format a citation for a record.
    Cite {
        /// Record id (`987` or `zenodo-987`).
        id: String,

        /// Citation style: `chicago`, `mla`, `harvard` or `vancouver`.
        #[arg(long, default_value = "chicago")]
        style: String,

        /// Print a CSL-JSON item instead of formatted text.
        #[arg(long)]
        csl: bool,
    },

    /// Summarize a built search artifact.
    Stats {
        /// Artifact path (defaults to `paths.index_output`).
        #[arg(long)]
        index: Option<PathBuf>,
    },
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = if quiet {
        EnvFilter::new(default)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Fetch => {
            connector_zenodo::run_fetch(&cfg).await?;
        }
        Commands::BuildIndex { input, output } => {
            index_cmd::run_build_index(&cfg, input, output)?;
        }
        Commands::Search { query, index, json } => {
            query::run_search(&cfg, &query, index.as_deref(), json).await?;
        }
        Commands::Browse {
            state,
            then,
            path,
            json,
        } => {
            browse_cmd::run_browse(&cfg, state.as_deref(), &then, path.as_deref(), json)?;
        }
        Commands::Get { id, jsonld } => {
            get::run_get(&cfg, &id, jsonld)?;
        }
        Commands::Cite { id, style, csl } => {
            cite::run_cite(&cfg, &id, &style, csl)?;
        }
        Commands::Stats { index } => {
            stats::run_stats(&cfg, index)?;
        }
    }

    Ok(())
}
