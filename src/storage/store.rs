use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::schema::Database;
use super::types::{CreatePostOutcome, Feed, NewPost, StoreError};

/// Storage operations the ingestion core depends on.
///
/// [`Database`] is the production implementation. The trait exists so the
/// selector, pipeline and scheduler can be driven against any store that
/// provides a uniqueness guarantee on post URLs.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// All feeds, least-recently-fetched first (never fetched before everything).
    async fn list_feeds_by_staleness(&self) -> Result<Vec<Feed>, StoreError>;

    /// Record that a feed was fetched at `at`. Must never move the timestamp backwards.
    ///
    /// Fails with `StoreError::NotFound` for an unknown feed.
    async fn mark_feed_fetched(&self, feed_id: i64, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Claim `feed` for an ingestion cycle by stamping it with `at`.
    ///
    /// Returns `false` if the feed's `last_fetched_at` no longer matches the value
    /// in `feed` (someone else claimed it first). The default implementation is an
    /// unconditional [`mark_feed_fetched`](PostStore::mark_feed_fetched) and always
    /// wins; stores with conditional writes should override it.
    async fn claim_feed(&self, feed: &Feed, at: DateTime<Utc>) -> Result<bool, StoreError> {
        self.mark_feed_fetched(feed.id, at).await?;
        Ok(true)
    }

    /// Insert a post, reporting [`CreatePostOutcome::Duplicate`] when the URL is already stored.
    async fn create_post(&self, post: &NewPost) -> Result<CreatePostOutcome, StoreError>;

    async fn feed_by_url(&self, url: &str) -> Result<Feed, StoreError>;
}

#[async_trait]
impl PostStore for Database {
    async fn list_feeds_by_staleness(&self) -> Result<Vec<Feed>, StoreError> {
        self.stalest_feeds().await
    }

    async fn mark_feed_fetched(&self, feed_id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.touch_feed_fetched(feed_id, at).await
    }

    async fn claim_feed(&self, feed: &Feed, at: DateTime<Utc>) -> Result<bool, StoreError> {
        self.claim_feed_if_unchanged(feed, at).await
    }

    async fn create_post(&self, post: &NewPost) -> Result<CreatePostOutcome, StoreError> {
        self.insert_post(post).await
    }

    async fn feed_by_url(&self, url: &str) -> Result<Feed, StoreError> {
        self.get_feed_by_url(url).await
    }
}
