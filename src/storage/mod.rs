//! SQLite persistence for users, feeds, follows and posts.
//!
//! `Database` is split across files by table; every operation returns a
//! typed [`StoreError`] so callers can tell "nothing there" and "already
//! there" apart from real failures.

mod feeds;
mod follows;
mod posts;
mod schema;
mod types;
mod users;

pub use schema::Database;
pub use types::{Feed, FeedFollow, FeedWithOwner, NewPost, Post, StoreError, User};
