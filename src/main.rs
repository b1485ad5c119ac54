//! # docqa CLI
//!
//! The `docqa` binary builds a local knowledge base from documents, images,
//! recordings, and spreadsheets, and answers questions about it with a
//! language model.
//!
//! ## Usage
//!
//! ```bash
//! docqa --config ./config/docqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa init` | Create the SQLite database and its table |
//! | `docqa upload <paths...>` | Extract text from files and store it |
//! | `docqa list` | Show stored records with a text preview |
//! | `docqa files` | Show the distinct file names in the knowledge base |
//! | `docqa show <id>` | Print one record in full |
//! | `docqa delete <id>` | Remove one record |
//! | `docqa ask "<question>"` | Answer a question from all stored text |
//! | `docqa serve` | Start the JSON HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! docqa init --config ./config/docqa.toml
//! docqa upload ./inbox --include '**/*.pdf' --include '**/*.docx'
//! docqa ask "What was the revenue growth?"
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use docqa::answer::{self, AnswerService};
use docqa::config;
use docqa::ingest;
use docqa::server;
use docqa::store::DocumentStore;
use docqa::view;

/// docqa: ask questions about your documents.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/docqa.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "docqa",
    about = "docqa: a local document knowledge base with LLM question answering",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docqa.toml")]
    config: PathBuf,

    /// Log debug output to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database.
    ///
    /// Creates the SQLite file and the document table. Safe to run more
    /// than once.
    Init,

    /// Extract text from files and store it.
    ///
    /// Files are processed one at a time. Unsupported, empty, or unreadable
    /// files are reported and skipped; the rest of the batch continues.
    Upload {
        /// Files or directories (walked recursively).
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Only take files matching these globs from directories.
        #[arg(long)]
        include: Vec<String>,
    },

    /// List stored records with a 100-character text preview.
    List,

    /// List the distinct file names in the knowledge base.
    Files,

    /// Print one stored record in full.
    Show {
        id: i64,
    },

    /// Delete one stored record. Deleting a missing id is not an error.
    Delete {
        id: i64,
    },

    /// Answer a question from every stored document.
    Ask {
        question: String,

        /// Print the assembled context block before the answer.
        #[arg(long)]
        show_context: bool,
    },

    /// Start the JSON HTTP API on `[server].bind`.
    Serve,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "docqa=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = DocumentStore::open(&cfg).await?;
            store.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Upload { paths, include } => {
            ingest::run_upload(&cfg, &paths, &include).await?;
        }
        Commands::List => {
            view::run_list(&cfg).await?;
        }
        Commands::Files => {
            view::run_files(&cfg).await?;
        }
        Commands::Show { id } => {
            view::run_show(&cfg, id).await?;
        }
        Commands::Delete { id } => {
            view::run_delete(&cfg, id).await?;
        }
        Commands::Ask {
            question,
            show_context,
        } => {
            let store = DocumentStore::open(&cfg).await?;
            let block = answer::prepare_context(&store, &question).await;
            store.close().await;
            let block = block?;

            if show_context {
                println!("--- Context ---");
                print!("{}", block);
                println!("--- Answer ---");
            }
            let service = AnswerService::from_config(&cfg)?;
            println!("{}", service.answer(&block, &question).await);
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
