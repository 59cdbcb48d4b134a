use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::RelayError;

/// Timestamp layout used by the feeds this relay subscribes to.
pub const PUB_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// One syndication item. Immutable once parsed; identity is `link`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: String,
}

impl FeedEntry {
    fn from_rss_item(item: &rss::Item) -> Result<Self, RelayError> {
        Ok(Self {
            title: required(item.title(), "title")?,
            link: required(item.link(), "link")?,
            description: required(item.description(), "description")?,
            pub_date: required(item.pub_date(), "pubDate")?,
        })
    }

    pub fn published_at(&self) -> Result<DateTime<Utc>, RelayError> {
        NaiveDateTime::parse_from_str(&self.pub_date, PUB_DATE_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|source| RelayError::Timestamp {
                value: self.pub_date.clone(),
                source,
            })
    }
}

fn required(value: Option<&str>, field: &'static str) -> Result<String, RelayError> {
    value
        .map(ToOwned::to_owned)
        .ok_or(RelayError::MissingField(field))
}

/// Parses a fetched document into entries, preserving document order.
/// A non-parseable document or an item with a missing required field is
/// fatal for the calling poll cycle.
pub fn parse_feed(raw: &str) -> Result<Vec<FeedEntry>, RelayError> {
    let channel = rss::Channel::read_from(raw.as_bytes())?;
    channel.items().iter().map(FeedEntry::from_rss_item).collect()
}

/// Drops entries older than `max_age`. The boundary is inclusive: an entry
/// published exactly `now - max_age` is retained.
///
/// With `strict` set, an unparseable timestamp aborts the cycle; otherwise
/// the offending entry is logged and skipped.
pub fn filter_recent(
    entries: Vec<FeedEntry>,
    now: DateTime<Utc>,
    max_age: Duration,
    strict: bool,
) -> Result<Vec<FeedEntry>, RelayError> {
    let cutoff = now - max_age;
    let mut kept = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.published_at() {
            Ok(published) => {
                if published >= cutoff {
                    kept.push(entry);
                }
            }
            Err(err) if strict => return Err(err),
            Err(err) => {
                warn!(link = %entry.link, error = %err, "skipping entry with bad timestamp");
            }
        }
    }
    Ok(kept)
}
