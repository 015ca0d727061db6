//! Vedabase CLI - Bhagavad Gita verse lookup, fuzzy matching and cache management

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vedabase::config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "vedabase")]
#[command(version)]
#[command(about = "Bhagavad Gita verse lookup and transcript matching backed by a local cache")]
#[command(long_about = r#"
Vedabase resolves Bhagavad Gita verses into a local SQLite cache:
  • Lookup by reference ("BG 2.47", "2:47", "bg 15-7")
  • Fuzzy matching of garbled transliterations from transcripts
  • Keyword search over cached verses
  • MCP (stdio) and HTTP servers over the same cache

Example usage:
  vedabase seed
  vedabase lookup "BG 2.47"
  vedabase match "man mana bhava mad bhakto"
  vedabase mcp
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the database file (overrides VEDABASE_DB_PATH and the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a verse by reference
    Lookup {
        /// Verse reference, e.g. "BG 2.47"
        reference: String,

        /// Fetch again even if cached
        #[arg(long)]
        refresh: bool,
    },

    /// Match a garbled transliteration to the closest verses
    Match {
        /// Transliteration text (e.g. from a transcript)
        text: String,

        /// Number of candidates (1-5)
        #[arg(short, long, default_value = "3")]
        top: usize,
    },

    /// Search cached verses by keyword
    Search {
        /// Search query
        query: String,

        /// Maximum number of results (1-10)
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Show chapter metadata and summary
    Chapter {
        /// Chapter number (1-18)
        number: u32,
    },

    /// Download every verse from the bulk source into the cache
    Seed,

    /// Show cache statistics
    Stats,

    /// Write a default vedabase.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Run the MCP server on stdio
    Mcp,

    /// Run the HTTP JSON API
    Serve {
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Show version information
    Version,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

/// Print a JSON success envelope (no-op in human mode).
pub fn emit_success(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "ok": true,
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn emit_error(output_mode: OutputMode, err: &anyhow::Error) {
    match output_mode {
        OutputMode::Human => vedabase::ui::error(&format!("{:#}", err)),
        OutputMode::Json => {
            let envelope = serde_json::json!({ "ok": false, "error": format!("{:#}", err) });
            println!("{}", envelope);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries results and the MCP transport
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };

    if let Err(e) = run(cli, output_mode).await {
        emit_error(output_mode, &e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output_mode: OutputMode) -> anyhow::Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);

    match &cli.command {
        Commands::Init { force } => return commands::run_init(&config_path, *force, output_mode),
        Commands::Version => return commands::run_version(output_mode),
        _ => {}
    }

    let file_config = config::load_config(Some(&config_path))?;
    let db_path = config::resolve_database_path(cli.database.as_deref(), file_config.as_ref());
    let settings = file_config.unwrap_or_default();
    tracing::debug!("Using database {}", db_path.display());
    let resolver = settings.build_resolver(&db_path)?;

    match cli.command {
        Commands::Lookup { reference, refresh } => {
            commands::run_lookup(&resolver, &reference, refresh, output_mode).await
        }
        Commands::Match { text, top } => commands::run_match(&resolver, &text, top, output_mode),
        Commands::Search { query, limit } => commands::run_search(&resolver, &query, limit, output_mode),
        Commands::Chapter { number } => commands::run_chapter(&resolver, number, output_mode).await,
        Commands::Seed => commands::run_seed(&resolver, output_mode).await,
        Commands::Stats => commands::run_stats(&resolver, &db_path, output_mode),
        Commands::Mcp => {
            let service = vedabase::server::mcp::McpService::new(std::sync::Arc::new(resolver));
            service.run_stdio().await
        }
        Commands::Serve { port } => vedabase::server::start_server(port, std::sync::Arc::new(resolver)).await,
        Commands::Init { .. } | Commands::Version => Ok(()),
    }
}
