//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use gator::storage::{CreatePostOutcome, Feed, NewPost, Post, PostStore, StoreError};

/// In-memory [`PostStore`] without a database.
///
/// Uses the trait's default `claim_feed`, so selection goes through
/// `mark_feed_fetched`. Safe to use under a paused tokio clock.
#[derive(Default)]
pub struct MemoryStore {
    feeds: Mutex<Vec<Feed>>,
    posts: Mutex<Vec<Post>>,
    next_id: AtomicU64,
    /// Make `list_feeds_by_staleness` fail
    pub fail_listing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) as i64 + 1
    }

    pub fn add_feed(&self, name: &str, url: &str) -> Feed {
        let now = Utc::now();
        let feed = Feed {
            id: self.id(),
            name: name.to_string(),
            url: url.to_string(),
            user_id: 1,
            last_fetched_at: None,
            created_at: now,
            updated_at: now,
        };
        self.feeds.lock().unwrap().push(feed.clone());
        feed
    }

    pub fn feed(&self, id: i64) -> Option<Feed> {
        self.feeds.lock().unwrap().iter().find(|f| f.id == id).cloned()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn list_feeds_by_staleness(&self) -> Result<Vec<Feed>, StoreError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(StoreError::Locked);
        }
        let mut feeds = self.feeds.lock().unwrap().clone();
        // None sorts before Some
        feeds.sort_by_key(|f| (f.last_fetched_at, f.id));
        Ok(feeds)
    }

    async fn mark_feed_fetched(&self, feed_id: i64, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut feeds = self.feeds.lock().unwrap();
        let feed = feeds
            .iter_mut()
            .find(|f| f.id == feed_id)
            .ok_or_else(|| StoreError::NotFound(format!("feed #{}", feed_id)))?;
        feed.last_fetched_at = Some(feed.last_fetched_at.map_or(at, |prev| prev.max(at)));
        feed.updated_at = at;
        Ok(())
    }

    async fn create_post(&self, post: &NewPost) -> Result<CreatePostOutcome, StoreError> {
        let mut posts = self.posts.lock().unwrap();
        if posts.iter().any(|p| p.url == post.url) {
            return Ok(CreatePostOutcome::Duplicate);
        }
        let created = Post {
            id: self.id(),
            feed_id: post.feed_id,
            url: post.url.clone(),
            title: post.title.clone(),
            description: post.description.clone(),
            published_at: post.published_at,
            created_at: Utc::now(),
        };
        posts.push(created.clone());
        Ok(CreatePostOutcome::Created(created))
    }

    async fn feed_by_url(&self, url: &str) -> Result<Feed, StoreError> {
        self.feeds
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.url == url)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("feed {}", url)))
    }
}

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

/// RSS 2.0 document with one `<item>` per `(title, link)` pair.
pub fn rss(items: &[(&str, &str)]) -> String {
    let body: String = items
        .iter()
        .map(|(title, link)| {
            format!("<item><title>{}</title><link>{}</link></item>", title, link)
        })
        .collect();
    format!(
        r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Test</title>{}</channel></rss>"#,
        body
    )
}
