use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::error::ErrorKind;

// ============================================================================
// Error Types
// ============================================================================

/// Storage errors, classified so callers can tell expected conditions
/// (nothing found, duplicate URL) from real failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The lookup matched no row. The payload names what was looked up.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A UNIQUE constraint rejected the write. The existing row is untouched.
    #[error("Already exists: {0}")]
    Duplicate(String),

    /// Another process holds the database lock past the busy timeout
    #[error("Database is locked by another process: {0}")]
    Locked(#[source] sqlx::Error),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(#[source] sqlx::Error),

    /// Generic database error
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    /// Classify a sqlx error.
    ///
    /// Unique violations come from the driver's own error classification;
    /// lock contention still needs the message check since SQLite reports
    /// SQLITE_BUSY and SQLITE_LOCKED as generic database errors.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(db_err.message().to_string());
            }
        }

        let error_string = err.to_string().to_lowercase();
        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
        {
            return StoreError::Locked(err);
        }

        StoreError::Database(err)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Duplicate(_) => ErrorKind::Duplicate,
            StoreError::Locked(_) | StoreError::Migration(_) | StoreError::Database(_) => {
                ErrorKind::Store
            }
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::from_sqlx(err)
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// Timestamps are stored as INTEGER microseconds since the Unix epoch (UTC).
/// Microsecond resolution keeps back-to-back `mark_feed_fetched` calls from
/// tying in the least-recently-fetched ordering.
pub(crate) fn to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

pub(crate) fn from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or(DateTime::UNIX_EPOCH)
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl UserRow {
    pub(crate) fn into_user(self) -> User {
        User {
            id: self.id,
            name: self.name,
            created_at: from_micros(self.created_at),
            updated_at: from_micros(self.updated_at),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FeedRow {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_fetched_at: Option<i64>,
}

impl FeedRow {
    pub(crate) fn into_feed(self) -> Feed {
        Feed {
            id: self.id,
            name: self.name,
            url: self.url,
            user_id: self.user_id,
            created_at: from_micros(self.created_at),
            updated_at: from_micros(self.updated_at),
            last_fetched_at: self.last_fetched_at.map(from_micros),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PostRow {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PostRow {
    pub(crate) fn into_post(self) -> Post {
        Post {
            id: self.id,
            feed_id: self.feed_id,
            title: self.title,
            description: self.description,
            url: self.url,
            published_at: self.published_at.map(from_micros),
            created_at: from_micros(self.created_at),
            updated_at: from_micros(self.updated_at),
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A subscribed feed.
///
/// `last_fetched_at` is `None` until the ingestion loop picks the feed for
/// the first time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

/// Feed listing row joined with the owning user's name (`feeds` command)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedWithOwner {
    pub name: String,
    pub url: String,
    pub user_name: String,
}

/// Follow record joined with feed and user names
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedFollow {
    pub id: i64,
    pub user_id: i64,
    pub feed_id: i64,
    pub feed_name: String,
    pub user_name: String,
}

/// A stored post. `url` is unique across all feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Post as produced by the ingestion loop, before it has an id
#[derive(Debug, Clone)]
pub struct NewPost {
    pub feed_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}
