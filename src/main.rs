mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use thoughtweave::config::{ModePreference, ThoughtsConfig};

#[derive(Parser)]
#[command(name = "thoughtweave", version, about = "Capture thoughts and let a model organize them")]
struct Cli {
    /// Config file (default: ~/.thoughtweave/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Session mode: auto, remote, or demo
    #[arg(long, global = true)]
    mode: Option<ModePreference>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture a new thought
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List thoughts, newest first
    List {
        /// Search term; prefix with # to match tags
        #[arg(long)]
        filter: Option<String>,
        /// Show only thoughts carrying this tag
        #[arg(long, conflicts_with = "filter")]
        tag: Option<String>,
    },
    /// Show the tag cloud
    Tags {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Ask a question across all thoughts
    Synthesize {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Generate a thought of the day
    Daily {
        /// Avoid this theme if another is available
        #[arg(long)]
        exclude: Option<String>,
        /// Keep the generated summary as a favorite
        #[arg(long)]
        favorite: bool,
    },
    /// List favorite summaries
    Favorites,
    /// Remove a favorite summary
    Unfavorite { id: String },
    /// Import notes separated by blank lines (use - for stdin)
    Import { file: PathBuf },
    /// Export all thoughts and favorites as JSON to stdout
    Export,
    /// Capture a thought from a live transcript on stdin
    Record,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ThoughtsConfig::load_from(path)?,
        None => ThoughtsConfig::load()?,
    };
    if let Some(mode) = cli.mode {
        config.session.mode = mode;
    }

    // Log to stderr so stdout stays clean for export output.
    let filter = EnvFilter::try_new(&config.logging.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let session = cli::open_session(&config).await?;

    match cli.command {
        Command::Add { text } => cli::thoughts::add(&session, &text.join(" ")).await?,
        Command::List { filter, tag } => {
            cli::thoughts::list(&session, filter.as_deref(), tag.as_deref())?
        }
        Command::Tags { limit } => cli::thoughts::tags(&session, limit)?,
        Command::Synthesize { query } => {
            cli::thoughts::synthesize(&session, &query.join(" ")).await?
        }
        Command::Daily { exclude, favorite } => {
            cli::summaries::daily(&session, exclude.as_deref(), favorite).await?
        }
        Command::Favorites => cli::summaries::favorites(&session)?,
        Command::Unfavorite { id } => cli::summaries::unfavorite(&session, &id).await?,
        Command::Import { file } => cli::transfer::import(&session, &file).await?,
        Command::Export => cli::transfer::export(&session)?,
        Command::Record => cli::record::record(&session).await?,
    }

    Ok(())
}
