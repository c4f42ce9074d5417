use std::fmt;

use crate::feed::{FeedFetcher, RawItem};
use crate::storage::{CreatePostOutcome, Feed, NewPost, PostStore};

/// Terminal status of one ingestion cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestStatus {
    Success,
    /// Fetch or parse failed; nothing was written
    FetchFailed(String),
    /// A store write failed; items before it stay committed, the rest were not attempted
    StoreFailed(String),
}

impl IngestStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, IngestStatus::Success)
    }
}

/// Outcome of ingesting a single feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub feed_id: i64,
    pub feed_name: String,
    /// Items in the fetched document
    pub items_seen: usize,
    /// New posts written
    pub created: usize,
    /// Items whose URL was already stored
    pub duplicates: usize,
    /// Items without a link, which cannot be stored
    pub items_skipped: usize,
    pub status: IngestStatus,
}

impl IngestReport {
    fn new(feed: &Feed) -> Self {
        Self {
            feed_id: feed.id,
            feed_name: feed.name.clone(),
            items_seen: 0,
            created: 0,
            duplicates: 0,
            items_skipped: 0,
            status: IngestStatus::Success,
        }
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} items, {} new, {} already known",
            self.feed_name, self.items_seen, self.created, self.duplicates
        )?;
        if self.items_skipped > 0 {
            write!(f, ", {} without link", self.items_skipped)?;
        }
        match &self.status {
            IngestStatus::Success => Ok(()),
            IngestStatus::FetchFailed(e) => write!(f, " (fetch failed: {})", e),
            IngestStatus::StoreFailed(e) => write!(f, " (store failed: {})", e),
        }
    }
}

/// Build the post candidate for an item, or `None` if it has no link.
fn to_new_post(feed_id: i64, item: RawItem) -> Option<NewPost> {
    let url = item.link?;
    Some(NewPost {
        feed_id,
        url,
        title: item.title,
        description: item.description,
        published_at: item.published,
    })
}

/// Fetch `feed` and insert each of its items as a post, skipping URLs already stored.
///
/// Items are processed in document order. A fetch error aborts the cycle
/// before anything is written. A duplicate URL is the normal steady state and
/// is only counted. Any other store error stops the item loop; posts inserted
/// earlier in the cycle are kept.
pub async fn ingest<S: PostStore + ?Sized>(
    feed: &Feed,
    fetcher: &FeedFetcher,
    store: &S,
) -> IngestReport {
    let mut report = IngestReport::new(feed);

    let doc = match fetcher.fetch(&feed.url).await {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(feed_id = feed.id, feed = %feed.url, error = %e, "Feed fetch failed");
            report.status = IngestStatus::FetchFailed(e.to_string());
            return report;
        }
    };

    report.items_seen = doc.items.len();

    for item in doc.items {
        let Some(post) = to_new_post(feed.id, item) else {
            report.items_skipped += 1;
            continue;
        };

        match store.create_post(&post).await {
            Ok(CreatePostOutcome::Created(created)) => {
                report.created += 1;
                tracing::debug!(
                    feed_id = feed.id,
                    post_id = created.id,
                    title = created.title.as_deref().unwrap_or(""),
                    "New post"
                );
            }
            Ok(CreatePostOutcome::Duplicate) => report.duplicates += 1,
            Err(e) => {
                tracing::warn!(
                    feed_id = feed.id,
                    url = %post.url,
                    error = %e,
                    "Post insert failed, abandoning remaining items"
                );
                report.status = IngestStatus::StoreFailed(e.to_string());
                break;
            }
        }
    }

    if report.items_skipped > 0 {
        tracing::warn!(
            feed_id = feed.id,
            skipped = report.items_skipped,
            "Items without a link skipped"
        );
    }

    report
}
