use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, Feed, Link, Text};
use feed_rs::parser::{self, ParseFeedError};

use crate::util::unescape_html;

/// One fetched feed, reduced to what the aggregator stores.
///
/// Shaped like `<rss><channel>...</channel></rss>`. Missing elements come
/// back as empty strings, so a sparse feed never fails to decode; only a
/// body that is not a feed at all does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedDocument {
    pub channel: Channel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    pub title: String,
    pub link: String,
    pub description: String,
    /// `None` when the item has no date or one we can't read
    pub published_at: Option<DateTime<Utc>>,
}

/// Decode a feed document and normalize its human-readable text.
///
/// RSS 2.0 is the expected input; Atom, RSS 1.0 and JSON Feed decode too.
/// Unknown and namespaced elements (`atom:link`, `dc:creator`, media
/// extensions) are ignored. HTML entities that survive the XML layer
/// (double-escaped titles are common) are decoded afterwards in the channel
/// title and description and in each item's title and description.
pub fn parse_document(bytes: &[u8]) -> Result<FeedDocument, ParseFeedError> {
    let feed = parser::Builder::new()
        .timestamp_parser(parse_timestamp)
        .build()
        .parse(bytes)?;
    Ok(FeedDocument::from(feed))
}

impl From<Feed> for FeedDocument {
    fn from(feed: Feed) -> Self {
        let channel = Channel {
            title: text(feed.title),
            link: primary_link(&feed.links),
            description: text(feed.description),
            items: feed.entries.into_iter().map(Item::from).collect(),
        };
        FeedDocument { channel }
    }
}

impl From<Entry> for Item {
    fn from(entry: Entry) -> Self {
        let description = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();

        Item {
            title: text(entry.title),
            link: primary_link(&entry.links),
            description: unescape_html(&description).into_owned(),
            published_at: entry.published.or(entry.updated),
        }
    }
}

fn text(value: Option<Text>) -> String {
    value
        .map(|t| unescape_html(&t.content).into_owned())
        .unwrap_or_default()
}

/// The page link, skipping `rel="self"` links that point back at the feed.
fn primary_link(links: &[Link]) -> String {
    links
        .iter()
        .find(|l| l.rel.as_deref() != Some("self"))
        .or_else(|| links.first())
        .map(|l| l.href.clone())
        .unwrap_or_default()
}

/// Publication time from `<pubDate>` text.
///
/// RSS 2.0 mandates RFC 822 dates (`Mon, 02 Jan 2006 15:04:05 -0700`);
/// RFC 3339 is accepted as a fallback because Atom-minded generators emit
/// it. Anything else yields `None`, never an error.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
