//! Shared blocks CLI
//!
//! Inspect and manage a file-backed library of shared blocks.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use commands::Library;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Verbose forces debug output; otherwise RUST_LOG decides
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::user(format!("Failed to set tracing subscriber: {e}")))?;
    tracing::debug!("Verbose mode enabled");

    let Some(command) = cli.command else {
        println!("{} Shared blocks CLI", "blocks".green().bold());
        println!();
        println!("Run {} for available commands.", "blocks --help".cyan());
        return Ok(());
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let library = Library::open(&cli.library, cli.config.as_deref()).await?;
        execute_command(&library, command).await
    })
}

async fn execute_command(library: &Library, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::List { json } => commands::run_list(library, json),
        Commands::Search { query } => commands::run_search(library, &query),
        Commands::Show { id, json } => commands::run_show(library, &id, json),
        Commands::Create { text, title } => {
            commands::run_create(library, &text, title.as_deref()).await
        }
        Commands::Rename { id, title } => commands::run_rename(library, &id, &title).await,
        Commands::Delete { id, yes } => commands::run_delete(library, &id, yes).await,
    }
}
