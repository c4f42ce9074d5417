use chrono::{DateTime, Utc};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors surfaced by the post store.
///
/// A duplicate post URL is *not* an error: it is reported through
/// [`CreatePostOutcome::Duplicate`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint other than the post URL was violated
    #[error("Already exists: {0}")]
    Conflict(String),

    /// Another process holds the database lock
    #[error("Database is locked by another gator process. Please close it and try again.")]
    Locked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Classify a sqlx error, mapping SQLite lock conditions to [`StoreError::Locked`].
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_CANTOPEN (14)
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return StoreError::Locked;
        }

        StoreError::Database(err)
    }

    /// Map a unique-constraint violation to [`StoreError::Conflict`], everything else through
    /// [`StoreError::from_sqlx`].
    pub(crate) fn conflict_or(err: sqlx::Error, what: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(what.into())
            }
            _ => StoreError::from_sqlx(err),
        }
    }
}

/// Convert a stored Unix timestamp (seconds) into a UTC datetime.
pub(crate) fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// Same as [`from_unix`] for columns stored in milliseconds (`feeds.last_fetched_at`).
pub(crate) fn from_unix_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
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
            created_at: from_unix(self.created_at),
            updated_at: from_unix(self.updated_at),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FeedRow {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    pub last_fetched_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl FeedRow {
    pub(crate) fn into_feed(self) -> Feed {
        Feed {
            id: self.id,
            name: self.name,
            url: self.url,
            user_id: self.user_id,
            last_fetched_at: self.last_fetched_at.map(from_unix_millis),
            created_at: from_unix(self.created_at),
            updated_at: from_unix(self.updated_at),
        }
    }
}

/// Feed joined with its owner's name (used by the `feeds` listing)
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FeedOwnerRow {
    #[sqlx(flatten)]
    pub feed: FeedRow,
    pub owner_name: String,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FeedFollowRow {
    pub id: i64,
    pub user_id: i64,
    pub feed_id: i64,
    pub created_at: i64,
    pub user_name: String,
    pub feed_name: String,
}

impl FeedFollowRow {
    pub(crate) fn into_follow(self) -> FeedFollow {
        FeedFollow {
            id: self.id,
            user_id: self.user_id,
            feed_id: self.feed_id,
            created_at: from_unix(self.created_at),
            user_name: self.user_name,
            feed_name: self.feed_name,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PostRow {
    pub id: i64,
    pub feed_id: i64,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<i64>,
    pub created_at: i64,
}

impl PostRow {
    pub(crate) fn into_post(self) -> Post {
        Post {
            id: self.id,
            feed_id: self.feed_id,
            url: self.url,
            title: self.title,
            description: self.description,
            published_at: self.published_at.map(from_unix),
            created_at: from_unix(self.created_at),
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

/// A subscribable syndication source, identified by its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    /// User who added the feed
    pub user_id: i64,
    /// `None` until the feed has been claimed for the first time
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFollow {
    pub id: i64,
    pub user_id: i64,
    pub feed_id: i64,
    pub created_at: DateTime<Utc>,
    pub user_name: String,
    pub feed_name: String,
}

/// A stored feed item. `url` is globally unique and is the dedup key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub feed_id: i64,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Post candidate built by the ingestion pipeline.
///
/// `None` fields mean "not provided by the feed", which is distinct from an
/// empty string and is stored as SQL `NULL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub feed_id: i64,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Result of a deduplicated insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreatePostOutcome {
    Created(Post),
    /// A post with the same URL is already stored
    Duplicate,
}
