use chrono::{DateTime, Utc};

use super::schema::Database;
use super::types::{Feed, FeedOwnerRow, FeedRow, StoreError};

const FEED_COLUMNS: &str = "id, name, url, user_id, last_fetched_at, created_at, updated_at";

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Add a feed owned by `user_id`.
    ///
    /// # Errors
    ///
    /// `StoreError::Conflict` if a feed with this URL already exists.
    pub async fn create_feed(&self, name: &str, url: &str, user_id: i64) -> Result<Feed, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let row: FeedRow = sqlx::query_as(&format!(
            "INSERT INTO feeds (name, url, user_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING {FEED_COLUMNS}"
        ))
        .bind(name)
        .bind(url)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::conflict_or(e, format!("feed {}", url)))?;

        Ok(row.into_feed())
    }

    /// All feeds with the name of the user who added them, ordered by feed name.
    pub async fn list_feeds(&self) -> Result<Vec<(Feed, String)>, StoreError> {
        let rows: Vec<FeedOwnerRow> = sqlx::query_as(
            r#"
                SELECT
                    f.id, f.name, f.url, f.user_id, f.last_fetched_at,
                    f.created_at, f.updated_at,
                    u.name AS owner_name
                FROM feeds f
                JOIN users u ON u.id = f.user_id
                ORDER BY f.name, f.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.feed.into_feed(), row.owner_name))
            .collect())
    }

    pub async fn get_feed(&self, feed_id: i64) -> Result<Feed, StoreError> {
        let row: Option<FeedRow> =
            sqlx::query_as(&format!("SELECT {FEED_COLUMNS} FROM feeds WHERE id = ?"))
                .bind(feed_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(FeedRow::into_feed)
            .ok_or_else(|| StoreError::NotFound(format!("feed #{}", feed_id)))
    }

    pub async fn get_feed_by_url(&self, url: &str) -> Result<Feed, StoreError> {
        let row: Option<FeedRow> =
            sqlx::query_as(&format!("SELECT {FEED_COLUMNS} FROM feeds WHERE url = ?"))
                .bind(url)
                .fetch_optional(&self.pool)
                .await?;

        row.map(FeedRow::into_feed)
            .ok_or_else(|| StoreError::NotFound(format!("feed {}", url)))
    }

    /// Feeds ordered least-recently-fetched first.
    ///
    /// Never-fetched feeds (`NULL`) sort before everything else; ties are broken
    /// by id so selection is deterministic.
    pub async fn stalest_feeds(&self) -> Result<Vec<Feed>, StoreError> {
        let rows: Vec<FeedRow> = sqlx::query_as(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds ORDER BY last_fetched_at ASC NULLS FIRST, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FeedRow::into_feed).collect())
    }

    /// Stamp `last_fetched_at` (millisecond resolution), never moving it backwards.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if no feed has this id.
    pub async fn touch_feed_fetched(
        &self,
        feed_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let ts = at.timestamp_millis();
        let result = sqlx::query(
            "UPDATE feeds SET last_fetched_at = MAX(?, COALESCE(last_fetched_at, ?)), updated_at = ? \
             WHERE id = ?",
        )
        .bind(ts)
        .bind(ts)
        .bind(chrono::Utc::now().timestamp())
        .bind(feed_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("feed #{}", feed_id)));
        }
        Ok(())
    }

    /// Conditionally stamp `last_fetched_at`: succeeds only if the stored value is
    /// still the one observed in `feed`.
    ///
    /// Returns `false` when another worker claimed the feed in between. The
    /// comparison uses `IS` so a `NULL` (never fetched) observation matches.
    pub async fn claim_feed_if_unchanged(
        &self,
        feed: &Feed,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let ts = at.timestamp_millis();
        let seen = feed.last_fetched_at.map(|t| t.timestamp_millis());
        let result = sqlx::query(
            "UPDATE feeds SET last_fetched_at = MAX(?, COALESCE(last_fetched_at, ?)), updated_at = ? \
             WHERE id = ? AND last_fetched_at IS ?",
        )
        .bind(ts)
        .bind(ts)
        .bind(chrono::Utc::now().timestamp())
        .bind(feed.id)
        .bind(seen)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, StoreError, User};
    use chrono::DateTime;

    async fn test_db() -> (Database, User) {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.create_user("owner").await.unwrap();
        (db, user)
    }

    #[tokio::test]
    async fn test_create_feed_and_lookup_by_url() {
        let (db, user) = test_db().await;
        let feed = db
            .create_feed("Blog", "https://blog.example.com/rss", user.id)
            .await
            .unwrap();

        assert_eq!(feed.last_fetched_at, None);
        let found = db.get_feed_by_url("https://blog.example.com/rss").await.unwrap();
        assert_eq!(found, feed);
    }

    #[tokio::test]
    async fn test_duplicate_feed_url_is_conflict() {
        let (db, user) = test_db().await;
        db.create_feed("A", "https://blog.example.com/rss", user.id)
            .await
            .unwrap();

        let err = db
            .create_feed("B", "https://blog.example.com/rss", user.id)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_list_feeds_includes_owner() {
        let (db, user) = test_db().await;
        db.create_feed("Blog", "https://blog.example.com/rss", user.id)
            .await
            .unwrap();

        let feeds = db.list_feeds().await.unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].0.name, "Blog");
        assert_eq!(feeds[0].1, "owner");
    }

    #[tokio::test]
    async fn test_stalest_feeds_order() {
        let (db, user) = test_db().await;
        let f1 = db.create_feed("F1", "https://one.example.com", user.id).await.unwrap();
        let f2 = db.create_feed("F2", "https://two.example.com", user.id).await.unwrap();
        let f3 = db.create_feed("F3", "https://three.example.com", user.id).await.unwrap();

        db.touch_feed_fetched(f3.id, DateTime::from_timestamp(2, 0).unwrap())
            .await
            .unwrap();
        db.touch_feed_fetched(f2.id, DateTime::from_timestamp(1, 0).unwrap())
            .await
            .unwrap();

        let ids: Vec<i64> = db.stalest_feeds().await.unwrap().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![f1.id, f2.id, f3.id]);
    }

    #[tokio::test]
    async fn test_touch_never_moves_backwards() {
        let (db, user) = test_db().await;
        let feed = db.create_feed("F", "https://f.example.com", user.id).await.unwrap();

        db.touch_feed_fetched(feed.id, DateTime::from_timestamp(100, 0).unwrap())
            .await
            .unwrap();
        db.touch_feed_fetched(feed.id, DateTime::from_timestamp(50, 0).unwrap())
            .await
            .unwrap();

        let feed = db.get_feed(feed.id).await.unwrap();
        assert_eq!(feed.last_fetched_at, DateTime::from_timestamp(100, 0));
    }

    #[tokio::test]
    async fn test_touch_unknown_feed_is_not_found() {
        let (db, _) = test_db().await;
        let err = db
            .touch_feed_fetched(999, chrono::Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_claim_succeeds_once_per_observation() {
        let (db, user) = test_db().await;
        let feed = db.create_feed("F", "https://f.example.com", user.id).await.unwrap();
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        // Two workers observed the same never-fetched row
        assert!(db.claim_feed_if_unchanged(&feed, now).await.unwrap());
        assert!(!db.claim_feed_if_unchanged(&feed, now).await.unwrap());

        let claimed = db.get_feed(feed.id).await.unwrap();
        assert_eq!(claimed.last_fetched_at, Some(now));
        // A fresh observation can claim again
        assert!(db.claim_feed_if_unchanged(&claimed, now).await.unwrap());
    }

    #[tokio::test]
    async fn test_sub_second_stamps_keep_their_order() {
        let (db, user) = test_db().await;
        let a = db.create_feed("A", "https://a.example.com", user.id).await.unwrap();
        let b = db.create_feed("B", "https://b.example.com", user.id).await.unwrap();
        let b_at = DateTime::from_timestamp_millis(10_200).unwrap();
        let a_at = DateTime::from_timestamp_millis(10_700).unwrap();

        db.touch_feed_fetched(b.id, b_at).await.unwrap();
        db.touch_feed_fetched(a.id, a_at).await.unwrap();

        let feeds = db.stalest_feeds().await.unwrap();
        assert_eq!(feeds[0].id, b.id);
        assert_eq!(feeds[0].last_fetched_at, Some(b_at));
        assert_eq!(feeds[1].last_fetched_at, Some(a_at));

        // The compare value carries the same precision
        assert!(db.claim_feed_if_unchanged(&feeds[0], a_at).await.unwrap());
    }
}
