use super::schema::Database;
use super::types::{FeedFollow, FeedFollowRow, StoreError};

impl Database {
    // ========================================================================
    // Feed Follow Operations
    // ========================================================================

    /// Make `user_id` follow `feed_id`.
    ///
    /// # Errors
    ///
    /// `StoreError::Conflict` if the user already follows the feed.
    pub async fn create_feed_follow(
        &self,
        user_id: i64,
        feed_id: i64,
    ) -> Result<FeedFollow, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO feed_follows (user_id, feed_id, created_at) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(user_id)
        .bind(feed_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StoreError::conflict_or(e, format!("follow of feed #{}", feed_id)))?;

        let row: FeedFollowRow = sqlx::query_as(
            r#"
                SELECT ff.id, ff.user_id, ff.feed_id, ff.created_at,
                       u.name AS user_name, f.name AS feed_name
                FROM feed_follows ff
                JOIN users u ON u.id = ff.user_id
                JOIN feeds f ON f.id = ff.feed_id
                WHERE ff.id = ?
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into_follow())
    }

    /// Follows of a user, oldest first.
    pub async fn get_feed_follows_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<FeedFollow>, StoreError> {
        let rows: Vec<FeedFollowRow> = sqlx::query_as(
            r#"
                SELECT ff.id, ff.user_id, ff.feed_id, ff.created_at,
                       u.name AS user_name, f.name AS feed_name
                FROM feed_follows ff
                JOIN users u ON u.id = ff.user_id
                JOIN feeds f ON f.id = ff.feed_id
                WHERE ff.user_id = ?
                ORDER BY ff.created_at, ff.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FeedFollowRow::into_follow).collect())
    }

    /// Stop following the feed at `url`.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if the user does not follow that feed.
    pub async fn delete_feed_follow(&self, user_id: i64, url: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
                DELETE FROM feed_follows
                WHERE user_id = ?
                  AND feed_id = (SELECT id FROM feeds WHERE url = ?)
            "#,
        )
        .bind(user_id)
        .bind(url)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("follow of {}", url)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, StoreError};

    #[tokio::test]
    async fn test_follow_lifecycle() {
        let db = Database::open(":memory:").await.unwrap();
        let alice = db.create_user("alice").await.unwrap();
        let bob = db.create_user("bob").await.unwrap();
        let feed = db
            .create_feed("Blog", "https://blog.example.com/rss", alice.id)
            .await
            .unwrap();

        let follow = db.create_feed_follow(bob.id, feed.id).await.unwrap();
        assert_eq!(follow.user_name, "bob");
        assert_eq!(follow.feed_name, "Blog");

        let follows = db.get_feed_follows_for_user(bob.id).await.unwrap();
        assert_eq!(follows, vec![follow]);

        db.delete_feed_follow(bob.id, "https://blog.example.com/rss")
            .await
            .unwrap();
        assert!(db.get_feed_follows_for_user(bob.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_double_follow_is_conflict() {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.create_user("alice").await.unwrap();
        let feed = db
            .create_feed("Blog", "https://blog.example.com/rss", user.id)
            .await
            .unwrap();

        db.create_feed_follow(user.id, feed.id).await.unwrap();
        let err = db.create_feed_follow(user.id, feed.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_unfollow_without_follow_is_not_found() {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.create_user("alice").await.unwrap();

        let err = db
            .delete_feed_follow(user.id, "https://nowhere.example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
