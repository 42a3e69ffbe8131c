//! Error categories shared by every layer of the aggregator.
//!
//! Each module keeps its own `thiserror` enum (with the underlying cause
//! attached as a source) and maps it onto one of these categories through a
//! `kind()` method. The scheduler absorbs `NotFound` (nothing to fetch) and
//! `Duplicate` (post already stored) by category, never by matching on
//! message text.

use std::fmt;

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad interval, unreadable config file. Fatal at startup.
    Config,
    /// A lookup found nothing: no feeds to fetch, unknown user or feed.
    NotFound,
    /// Network, timeout, HTTP status or XML failure while fetching a feed.
    Fetch,
    /// A unique constraint rejected an insert.
    Duplicate,
    /// Any other persistence failure.
    Store,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Config => "config",
            ErrorKind::NotFound => "not found",
            ErrorKind::Fetch => "fetch",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::Store => "store",
        };
        f.write_str(name)
    }
}
