use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use gator::commands::{self, Command, State};
use gator::config::Config;
use gator::storage::{Database, StoreError};

#[derive(Parser, Debug)]
#[command(name = "gator", version, about = "Command-line RSS/Atom aggregator")]
struct Args {
    /// Config file (default: ~/.config/gator/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with command output
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => Config::default_dir()
            .context("Cannot locate the config directory")?
            .join("config.toml"),
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from '{}'", config_path.display()))?;

    let db_path = config.resolve_db_path(&config_path);
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create '{}'", parent.display()))?;
    }

    let db_path_str = db_path
        .to_str()
        .context("Database path contains invalid UTF-8 characters")?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(StoreError::Locked) => {
            eprintln!("Error: {}", StoreError::Locked);
            std::process::exit(1);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to open database '{}'", db_path.display()))
        }
    };
    tracing::debug!(path = %db_path.display(), "Database opened");

    let mut state = State::new(db, config, config_path);
    commands::run(&mut state, args.command)
        .await
        .context("Command failed")?;

    Ok(())
}
