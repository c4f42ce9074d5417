//! CLI command handlers.
//!
//! Each subcommand is a variant of [`Command`] and is dispatched by
//! [`execute`]. Handlers write user-facing output to the supplied writer;
//! diagnostics go through `tracing`.

mod agg;
mod browse;
mod feeds;
mod users;

use clap::Subcommand;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::feed::FetchError;
use crate::storage::{Database, StoreError, User};
use crate::util::UrlValidationError;

/// Default number of posts shown by `browse`
pub const DEFAULT_BROWSE_LIMIT: u32 = 2;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No user is logged in. Run `gator register <name>` or `gator login <name>` first.")]
    NotLoggedIn,

    /// The configured current user no longer exists (e.g. after `reset`)
    #[error("User '{0}' does not exist")]
    UnknownUser(String),

    #[error("User '{0}' is already registered. Try another name.")]
    AlreadyRegistered(String),

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] UrlValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to build HTTP client: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create a user and log in as them
    Register { name: String },

    /// Switch the current user
    Login { name: String },

    /// Delete all users and feeds, along with their follows and posts
    Reset,

    /// List registered users
    Users,

    /// Add a feed and follow it as the current user
    #[command(name = "addfeed")]
    AddFeed { name: String, url: String },

    /// List all feeds with the user who added them
    Feeds,

    /// Follow an existing feed by URL
    Follow { url: String },

    /// List the feeds the current user follows
    Following,

    /// Stop following a feed
    Unfollow { url: String },

    /// Show the newest posts from followed feeds
    Browse {
        #[arg(default_value_t = DEFAULT_BROWSE_LIMIT)]
        limit: u32,
    },

    /// Fetch feeds continuously, one per interval, until interrupted
    Agg {
        /// Time between fetches, e.g. 30s, 1m, 1h30m
        interval: String,

        /// Stop after this many ticks
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
    },
}

/// Everything a command handler needs.
pub struct State {
    pub db: Database,
    pub config: Config,
    /// Where `config` is persisted by `login`/`register`
    pub config_path: PathBuf,
}

impl State {
    pub fn new(db: Database, config: Config, config_path: PathBuf) -> Self {
        Self {
            db,
            config,
            config_path,
        }
    }

    /// Resolve the logged-in user through the store.
    pub async fn current_user(&self) -> Result<User, CommandError> {
        let name = self
            .config
            .current_user_name
            .as_deref()
            .ok_or(CommandError::NotLoggedIn)?;

        match self.db.get_user(name).await {
            Ok(user) => Ok(user),
            Err(StoreError::NotFound(_)) => Err(CommandError::UnknownUser(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

/// Run `command`, printing its output to stdout.
pub async fn run(state: &mut State, command: Command) -> Result<(), CommandError> {
    execute(state, command, &mut std::io::stdout()).await
}

/// Run `command`, writing its output to `out`.
pub async fn execute<W: Write>(
    state: &mut State,
    command: Command,
    out: &mut W,
) -> Result<(), CommandError> {
    tracing::debug!(?command, "Running command");

    match command {
        Command::Register { name } => users::register(state, &name, out).await,
        Command::Login { name } => users::login(state, &name, out).await,
        Command::Reset => users::reset(state, out).await,
        Command::Users => users::list(state, out).await,
        Command::AddFeed { name, url } => {
            let user = state.current_user().await?;
            feeds::add(state, &user, &name, &url, out).await
        }
        Command::Feeds => feeds::list(state, out).await,
        Command::Follow { url } => {
            let user = state.current_user().await?;
            feeds::follow(state, &user, &url, out).await
        }
        Command::Following => {
            let user = state.current_user().await?;
            feeds::following(state, &user, out).await
        }
        Command::Unfollow { url } => {
            let user = state.current_user().await?;
            feeds::unfollow(state, &user, &url, out).await
        }
        Command::Browse { limit } => {
            let user = state.current_user().await?;
            browse::browse(state, &user, limit, out).await
        }
        Command::Agg { interval, ticks } => agg::agg(state, &interval, ticks, out).await,
    }
}
