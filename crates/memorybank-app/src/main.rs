//! Memory Bank - annotate lecture PDFs and browse the knowledge graph.
//!
//! Main entry point for the `memorybank` CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};
use memorybank_app::commands::{self, annotate, auth, export, graph, notes};
use memorybank_app::{AppConfig, ShortcutRegistry};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Memory Bank - annotate lecture PDFs and browse the knowledge graph
#[derive(Parser)]
#[command(name = "memorybank")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// API base URL (default: http://localhost:8000)
    #[arg(long, global = true, env = "MEMORYBANK_API_BASE_URL")]
    pub api_url: Option<String>,

    /// Directory holding the saved login session
    #[arg(long, global = true, env = "MEMORYBANK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "MEMORYBANK_TIMEOUT_SECS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and remember the session
    Login(auth::LoginArgs),

    /// Create an account and sign in
    Register(auth::RegisterArgs),

    /// Forget the saved session
    Logout,

    /// Note management
    Notes(notes::NotesArgs),

    /// Render the knowledge graph to SVG
    Graph(graph::GraphArgs),

    /// Replay recorded pen input into a note and save it
    Annotate(annotate::AnnotateArgs),

    /// Write one annotated page as PNG
    ExportPage(export::ExportPageArgs),

    /// List annotation keyboard shortcuts
    Shortcuts,
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "memorybank=debug,memorybank_app=debug,memorybank_client=debug,memorybank_core=debug,info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    log::info!("Starting Memory Bank {}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::default().with_overrides(cli.api_url, cli.data_dir, cli.timeout);
    log::debug!("Using API at {}", config.api_base_url);

    let ctx = commands::Context::new(config, cli.json, cli.verbose);

    // Dispatch to command handlers
    match cli.command {
        Commands::Login(args) => auth::login(args, &ctx).await,
        Commands::Register(args) => auth::register(args, &ctx).await,
        Commands::Logout => auth::logout(&ctx).await,
        Commands::Notes(args) => notes::run(args, &ctx).await,
        Commands::Graph(args) => graph::run(args, &ctx).await,
        Commands::Annotate(args) => annotate::run(args, &ctx).await,
        Commands::ExportPage(args) => export::run(args, &ctx).await,
        Commands::Shortcuts => {
            ShortcutRegistry::print_all();
            Ok(())
        }
    }
}
