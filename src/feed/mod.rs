//! Feed retrieval: HTTP fetching and RSS decoding.
//!
//! - [`fetcher`] - one bounded HTTP GET per call, no retries
//! - [`document`] - the `<rss><channel><item>` model over `feed-rs`, plus entity cleanup
//!
//! # Example
//!
//! ```ignore
//! use gator::feed::FeedFetcher;
//!
//! let fetcher = FeedFetcher::new()?;
//! let doc = fetcher.fetch("https://blog.boot.dev/index.xml").await?;
//! for item in &doc.channel.items {
//!     println!("{} ({:?})", item.title, item.published_at);
//! }
//! ```

mod document;
mod fetcher;

pub use document::{parse_document, parse_timestamp, Channel, FeedDocument, Item};
pub use fetcher::{FeedFetcher, FetchError, DEFAULT_TIMEOUT, MAX_FEED_SIZE, USER_AGENT};
