//! # pdfshelf CLI (`shelf`)
//!
//! The `shelf` binary manages a directory of PDFs: listing, metadata,
//! full-text search, summaries, page extraction, EPUB conversion and the
//! HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! shelf --config ./config/shelf.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shelf list` | List PDFs in the store |
//! | `shelf info <name>` | Show a document's metadata |
//! | `shelf search "<query>"` | Ranked full-text search |
//! | `shelf summary <name>` | Extractive summary |
//! | `shelf extract <name> --from A --to B` | Copy a page range into a new PDF |
//! | `shelf convert <name>` | Convert to EPUB |
//! | `shelf rebuild` | Rebuild the index and print the report |
//! | `shelf serve` | Start the HTTP server |
//!
//! Logs go to stderr and are controlled with `RUST_LOG`
//! (default `pdfshelf=info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pdfshelf::{config, documents, epub, library, pages, search, server, summary};

/// pdfshelf: a local PDF library with full-text search.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/shelf.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "shelf",
    about = "pdfshelf: a local PDF library with full-text search, summaries and EPUB conversion",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shelf.toml")]
    config: PathBuf,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every PDF in the store, including ones that could not be indexed.
    List,

    /// Show metadata for one document.
    Info {
        /// Document file name, e.g. `report.pdf`.
        name: String,
    },

    /// Search indexed documents.
    ///
    /// Terms are matched case-insensitively; results are ranked by score
    /// with ties broken by file name.
    Search {
        /// Search query.
        query: String,

        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print an extractive summary of a document.
    Summary {
        name: String,

        /// Number of sentences (defaults to `[summary].sentences`).
        #[arg(long)]
        sentences: Option<usize>,
    },

    /// Copy a page range into a new PDF in the store.
    Extract {
        name: String,

        /// First page (1-based, inclusive).
        #[arg(long)]
        from: u32,

        /// Last page (inclusive).
        #[arg(long)]
        to: u32,

        /// Output document name (defaults to `<stem>_p<from>-<to>.pdf`).
        #[arg(long)]
        output: Option<String>,
    },

    /// Convert a document to EPUB.
    Convert {
        name: String,

        /// Output path (defaults to `<stem>.epub` in the working directory).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Rebuild the search index from the store directory.
    Rebuild,

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pdfshelf=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    if let Commands::Serve = cli.command {
        return server::run_server(&cfg).await;
    }

    // Commands that need the index trigger its build when they first wait on it.
    let lib = library::Library::open_lazy(cfg);
    let result = match cli.command {
        Commands::List => documents::run_list(&lib, cli.json).await,
        Commands::Info { name } => documents::run_info(&lib, &name, cli.json).await,
        Commands::Search { query, limit } => {
            search::run_search(&lib, &query, limit, cli.json).await
        }
        Commands::Summary { name, sentences } => {
            summary::run_summary(&lib, &name, sentences, cli.json).await
        }
        Commands::Extract {
            name,
            from,
            to,
            output,
        } => pages::run_extract(&lib, &name, from, to, output).await,
        Commands::Convert { name, output } => epub::run_convert(&lib, &name, output).await,
        Commands::Rebuild => library::run_rebuild(&lib, cli.json).await,
        Commands::Serve => {
            // Handled above (before opening the library)
            unreachable!()
        }
    };
    lib.shutdown().await;

    result
}
