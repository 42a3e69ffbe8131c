//! gator: a command-line RSS aggregator.
//!
//! Users follow feeds; `gator agg` walks the subscriptions one feed per tick,
//! least-recently-fetched first, and stores every new item as a post that
//! `gator browse` lists.
//!
//! - [`storage`] - SQLite persistence for users, feeds, follows and posts
//! - [`feed`] - HTTP fetching and RSS decoding
//! - [`scheduler`] - the ingestion loop
//! - [`commands`] - handlers behind each subcommand
//! - [`config`] - `~/.gatorconfig.json`

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod feed;
pub mod logging;
pub mod scheduler;
pub mod storage;
pub mod util;

pub use error::ErrorKind;
