//! # Manual Shelf CLI (`shelf`)
//!
//! The `shelf` binary builds the manual index and answers the same questions
//! the viewer does: which tags exist, which manuals match, which pages are
//! shown, and what link to share.
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
//! | `shelf index [ROOT] [OUTPUT]` | Scan the library and write `index.json` |
//! | `shelf sections` | Print tag sections |
//! | `shelf list` | List manuals, filtered by tags and search text |
//! | `shelf pages <PATH>` | Show hidden and visible pages of a manual |
//! | `shelf link <PATH>` | Print a shareable deep link |
//! | `shelf serve` | Start the viewer HTTP backend |
//!
//! ## Logging
//!
//! Logs go to stderr. `SHELF_LOG` takes an `EnvFilter` directive and wins
//! over `-q` / `-v` / `-vv`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use manual_shelf::progress::ProgressMode;
use manual_shelf::{browse, config, index, server};

/// Manual Shelf: index a folder of product manuals and browse it by tag.
#[derive(Parser)]
#[command(
    name = "shelf",
    about = "Manual Shelf: index a folder of product manuals and browse it by tag",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/shelf.toml`. When that default file does not
    /// exist, built-in defaults are used.
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index.
    ///
    /// Walks the library for PDFs and `.tags` files, reuses cached metadata
    /// for unchanged files, extracts metadata for new or changed ones, and
    /// writes `index.json` plus the updated extraction cache.
    Index {
        /// Library root (overrides `[library].root`).
        root: Option<PathBuf>,

        /// Index output path (defaults to `<root>/index.json`).
        output: Option<PathBuf>,

        /// Progress on stderr. Defaults to human when stderr is a terminal.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Print tag sections.
    Sections,

    /// List manuals.
    ///
    /// Filters combine across sections (AND) and within a section (OR).
    List {
        /// Tag filter `key=value`; markers are selected as `other=<tag>`.
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Case-insensitive text search over filename, title and tags.
        #[arg(long)]
        search: Option<String>,

        /// Print matching records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show which pages of a manual are hidden.
    Pages {
        /// Manual path relative to the library root.
        path: String,
    },

    /// Print a shareable deep link to a manual.
    Link {
        /// Manual path relative to the library root.
        path: String,

        /// Page to open (1-indexed).
        #[arg(long)]
        page: Option<u32>,
    },

    /// Start the viewer HTTP backend.
    Serve,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("SHELF_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Index {
            root,
            output,
            progress,
        } => {
            index::run_index(&cfg, root, output, progress).await?;
        }
        Commands::Sections => {
            browse::run_sections(&cfg)?;
        }
        Commands::List { tags, search, json } => {
            browse::run_list(&cfg, &tags, search.as_deref(), json)?;
        }
        Commands::Pages { path } => {
            browse::run_pages(&cfg, &path)?;
        }
        Commands::Link { path, page } => {
            browse::run_link(&cfg, &path, page)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
