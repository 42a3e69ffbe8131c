use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::error::ErrorKind;
use crate::feed::{FeedFetcher, FetchError, Item};
use crate::storage::{Database, Feed, NewPost, StoreError};

/// What happened to the posts of one fetched feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub feed_id: i64,
    pub feed_name: String,
    /// Items in the fetched document
    pub items: usize,
    /// New posts stored
    pub inserted: usize,
    /// Items whose URL was already stored
    pub duplicates: usize,
    /// Items without a link
    pub skipped: usize,
    /// Items the store rejected for any other reason
    pub failed: usize,
}

/// Result of a single scheduler cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Nothing subscribed yet
    NoFeeds,
    SelectFailed(StoreError),
    MarkFailed { feed: Feed, error: StoreError },
    FetchFailed { feed: Feed, error: FetchError },
    Collected(CycleReport),
}

impl CycleOutcome {
    /// One log line per cycle: `warn` for failures, `info` otherwise.
    pub fn log(&self) {
        match self {
            CycleOutcome::NoFeeds => {
                tracing::info!("No feeds to fetch, add one with `gator addfeed`");
            }
            CycleOutcome::SelectFailed(error) => {
                tracing::warn!(error = %error, "Couldn't select the next feed to fetch");
            }
            CycleOutcome::MarkFailed { feed, error } => {
                tracing::warn!(feed = %feed.name, error = %error, "Couldn't mark feed as fetched");
            }
            CycleOutcome::FetchFailed { feed, error } => {
                tracing::warn!(
                    feed = %feed.name,
                    url = %feed.url,
                    kind = %error.kind(),
                    error = %error,
                    "Couldn't collect feed"
                );
            }
            CycleOutcome::Collected(report) => {
                tracing::info!(
                    feed = %report.feed_name,
                    items = report.items,
                    new = report.inserted,
                    "Feed collected"
                );
            }
        }
    }
}

/// Collects one feed per tick until told to stop.
///
/// Each cycle picks the least-recently-fetched feed, stamps it as fetched,
/// downloads it and stores every item as a post. Failures are logged and
/// never stop the loop.
pub struct Aggregator {
    db: Database,
    fetcher: FeedFetcher,
    interval: Duration,
}

impl Aggregator {
    pub fn new(db: Database, fetcher: FeedFetcher, interval: Duration) -> Self {
        Self {
            db,
            fetcher,
            interval,
        }
    }

    /// Run cycles every `interval` until `shutdown` turns `true` or its
    /// sender is dropped.
    ///
    /// The first cycle starts immediately. Cycles never overlap: one that
    /// runs longer than the interval pushes the next tick back rather than
    /// causing a burst. A cycle already in flight is allowed to finish.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(interval = ?self.interval, "Collecting feeds");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                _ = ticker.tick() => {}
            }

            if is_shutdown(&shutdown) {
                break;
            }

            self.scrape_next_feed().await.log();
        }

        tracing::info!("Aggregator stopped");
    }

    /// One cycle: select, mark, fetch, store.
    ///
    /// The feed is marked fetched before the request goes out, so a feed that
    /// keeps failing still moves to the back of the rotation.
    pub async fn scrape_next_feed(&self) -> CycleOutcome {
        let feed = match self.db.next_feed_to_fetch().await {
            Ok(feed) => feed,
            Err(e) if e.kind() == ErrorKind::NotFound => return CycleOutcome::NoFeeds,
            Err(e) => return CycleOutcome::SelectFailed(e),
        };

        if let Err(error) = self.db.mark_feed_fetched(feed.id).await {
            return CycleOutcome::MarkFailed { feed, error };
        }

        tracing::debug!(feed = %feed.name, url = %feed.url, "Fetching feed");
        let document = match self.fetcher.fetch(&feed.url).await {
            Ok(document) => document,
            Err(error) => return CycleOutcome::FetchFailed { feed, error },
        };

        let report = self.store_items(&feed, document.channel.items).await;
        CycleOutcome::Collected(report)
    }

    async fn store_items(&self, feed: &Feed, items: Vec<Item>) -> CycleReport {
        let mut report = CycleReport {
            feed_id: feed.id,
            feed_name: feed.name.clone(),
            items: items.len(),
            ..CycleReport::default()
        };

        for item in items {
            let Some(post) = new_post(feed.id, item) else {
                tracing::debug!(feed = %feed.name, "Skipping item without a link");
                report.skipped += 1;
                continue;
            };

            match self.db.insert_post(&post).await {
                Ok(_) => report.inserted += 1,
                Err(e) if e.kind() == ErrorKind::Duplicate => {
                    tracing::debug!(url = %post.url, "Post already stored");
                    report.duplicates += 1;
                }
                Err(e) => {
                    tracing::warn!(feed = %feed.name, url = %post.url, error = %e, "Couldn't store post");
                    report.failed += 1;
                }
            }
        }

        report
    }
}

/// Map a feed item onto a post row. Items without a link have no identity
/// and are dropped.
fn new_post(feed_id: i64, item: Item) -> Option<NewPost> {
    let url = item.link.trim();
    if url.is_empty() {
        return None;
    }

    let description = Some(item.description).filter(|d| !d.trim().is_empty());

    Some(NewPost {
        feed_id,
        title: item.title,
        description,
        url: url.to_owned(),
        published_at: item.published_at,
    })
}

/// Resolves once shutdown is signalled or the sender is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

fn is_shutdown(shutdown: &watch::Receiver<bool>) -> bool {
    *shutdown.borrow() || shutdown.has_changed().is_err()
}
