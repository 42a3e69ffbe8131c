//! Command handlers.
//!
//! Every command runs against an [`AppState`] (config plus open database)
//! and returns the lines it wants printed. Commands that act on behalf of the
//! current user implement [`UserCommand`] and are run through [`logged_in`],
//! which resolves the user first and refuses to run the handler without one.

mod agg;
mod browse;
mod feeds;
mod users;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::cli::Command;
use crate::config::{Config, ConfigError};
use crate::error::ErrorKind;
use crate::feed::FetchError;
use crate::storage::{Database, StoreError, User};
use crate::util::UrlValidationError;

pub use agg::agg;
pub use browse::Browse;
pub use feeds::{list_feeds, AddFeed, Follow, Following, Unfollow};
pub use users::{list_users, login, register, reset};

/// Lines of output for the terminal
pub type Output = Vec<String>;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Not logged in: run `gator register <name>` or `gator login <name>` first")]
    NotLoggedIn,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] UrlValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommandError::NotLoggedIn | CommandError::NotFound(_) => ErrorKind::NotFound,
            CommandError::InvalidUrl(_) => ErrorKind::Config,
            CommandError::Config(e) => e.kind(),
            CommandError::Store(e) => e.kind(),
            CommandError::Fetch(e) => e.kind(),
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// Everything a command needs: the loaded config and the database it points at.
pub struct AppState {
    pub config: Config,
    pub db: Database,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        Self { config, db }
    }

    /// Read the config (from `config_path`, or `~/.gatorconfig.json`) and
    /// open its database.
    pub async fn load(config_path: Option<&Path>) -> Result<Self, CommandError> {
        let config = match config_path {
            Some(path) => Config::load(path)?,
            None => Config::read()?,
        };
        let db = Database::open(&config.db_url).await?;
        Ok(Self::new(config, db))
    }

    /// The user named in the config, or why there is none.
    pub async fn current_user(&self) -> Result<User, CommandError> {
        let name = self
            .config
            .current_user_name
            .as_deref()
            .ok_or(CommandError::NotLoggedIn)?;

        match self.db.get_user(name).await {
            Ok(user) => Ok(user),
            Err(StoreError::NotFound(_)) => Err(CommandError::NotFound(format!(
                "current user '{}' (log in again)",
                name
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Logged-in Commands
// ============================================================================

/// A command that acts as the current user.
#[async_trait]
pub trait UserCommand: Send + Sync {
    async fn run(&self, state: &AppState, user: User) -> Result<Output, CommandError>;
}

/// Resolve the current user, then run `command` as them.
///
/// Fails closed: without a configured user, or when that user no longer
/// exists, the handler is never called.
pub async fn logged_in<C>(state: &AppState, command: &C) -> Result<Output, CommandError>
where
    C: UserCommand + ?Sized,
{
    let user = state.current_user().await?;
    tracing::debug!(user = %user.name, "Running as current user");
    command.run(state, user).await
}

// ============================================================================
// Dispatch
// ============================================================================

/// Run one parsed command line.
pub async fn execute(state: &mut AppState, command: Command) -> Result<Output, CommandError> {
    match command {
        Command::Register { name } => register(state, &name).await,
        Command::Login { name } => login(state, &name).await,
        Command::Reset => reset(state).await,
        Command::Users => list_users(state).await,
        Command::Agg { time_between_reqs } => agg(state, &time_between_reqs).await,
        Command::Addfeed { name, url } => logged_in(state, &AddFeed { name, url }).await,
        Command::Feeds => list_feeds(state).await,
        Command::Follow { url } => logged_in(state, &Follow { url }).await,
        Command::Following => logged_in(state, &Following).await,
        Command::Unfollow { url } => logged_in(state, &Unfollow { url }).await,
        Command::Browse { limit } => logged_in(state, &Browse { limit }).await,
    }
}
