use chrono::{DateTime, Utc};
use feed_rs::model::Link;
use feed_rs::parser;

use crate::util::clean_text;

/// Parsed feed document: channel metadata plus items in document order.
///
/// Transient; lives for a single ingestion cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeedDocument {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub items: Vec<RawItem>,
}

/// A single feed entry. Every field is independently optional; empty text
/// fields are reported as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

/// Parse RSS 0.9x/1.0/2.0, Atom or JSON Feed bytes.
///
/// Text fields are entity-decoded and cleaned with [`clean_text`].
pub fn parse_feed(bytes: &[u8]) -> Result<RawFeedDocument, parser::ParseFeedError> {
    let feed = parser::parse(bytes)?;

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = item_link(&entry.links);
            let description = entry
                .summary
                .and_then(|s| clean_text(&s.content))
                .or_else(|| {
                    entry
                        .content
                        .and_then(|c| c.body)
                        .and_then(|body| clean_text(&body))
                });

            RawItem {
                title: entry.title.and_then(|t| clean_text(&t.content)),
                link,
                description,
                published: entry.published.or(entry.updated),
            }
        })
        .collect();

    Ok(RawFeedDocument {
        title: feed.title.and_then(|t| clean_text(&t.content)),
        description: feed.description.and_then(|d| clean_text(&d.content)),
        link: feed.links.first().map(|l| l.href.clone()),
        items,
    })
}

/// The entry's permalink: the first `alternate` (or untyped) link, else the first link.
///
/// Atom entries often list `replies`, `self` or `edit` links ahead of the
/// article itself.
fn item_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
        .or_else(|| links.first())
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty())
}
