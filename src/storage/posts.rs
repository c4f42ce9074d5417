use super::schema::Database;
use super::types::{CreatePostOutcome, NewPost, Post, PostRow, StoreError};

/// Maximum number of posts returned by a single browse query
const MAX_BROWSE_LIMIT: i64 = 500;

impl Database {
    // ========================================================================
    // Post Operations
    // ========================================================================

    /// Insert a post unless one with the same URL already exists.
    ///
    /// A single `INSERT ... ON CONFLICT(url) DO NOTHING` statement, so concurrent
    /// ingestion cycles racing on the same item cannot both create it.
    pub async fn insert_post(&self, post: &NewPost) -> Result<CreatePostOutcome, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let row: Option<PostRow> = sqlx::query_as(
            r#"
            INSERT INTO posts (feed_id, url, title, description, published_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO NOTHING
            RETURNING id, feed_id, url, title, description, published_at, created_at
        "#,
        )
        .bind(post.feed_id)
        .bind(&post.url)
        .bind(&post.title)
        .bind(&post.description)
        .bind(post.published_at.map(|t| t.timestamp()))
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from_sqlx)?;

        Ok(match row {
            Some(row) => CreatePostOutcome::Created(row.into_post()),
            None => CreatePostOutcome::Duplicate,
        })
    }

    /// Newest posts from the feeds a user follows.
    ///
    /// Posts without a publish date sort after dated ones; `limit` is capped at
    /// [`MAX_BROWSE_LIMIT`].
    pub async fn get_posts_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<Post>, StoreError> {
        let limit = limit.clamp(0, MAX_BROWSE_LIMIT);
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
                SELECT p.id, p.feed_id, p.url, p.title, p.description,
                       p.published_at, p.created_at
                FROM posts p
                JOIN feed_follows ff ON ff.feed_id = p.feed_id
                WHERE ff.user_id = ?
                ORDER BY p.published_at DESC NULLS LAST, p.created_at DESC, p.id DESC
                LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostRow::into_post).collect())
    }

    /// All posts of one feed in insertion order.
    pub async fn get_posts_for_feed(&self, feed_id: i64) -> Result<Vec<Post>, StoreError> {
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
                SELECT id, feed_id, url, title, description, published_at, created_at
                FROM posts
                WHERE feed_id = ?
                ORDER BY id
            "#,
        )
        .bind(feed_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostRow::into_post).collect())
    }

    pub async fn count_posts(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{CreatePostOutcome, Database, NewPost};
    use chrono::DateTime;

    async fn seeded() -> (Database, i64, i64) {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.create_user("alice").await.unwrap();
        let feed = db
            .create_feed("Blog", "https://blog.example.com/rss", user.id)
            .await
            .unwrap();
        (db, user.id, feed.id)
    }

    fn new_post(feed_id: i64, url: &str, published: Option<i64>) -> NewPost {
        NewPost {
            feed_id,
            url: url.to_string(),
            title: Some(format!("Title of {}", url)),
            description: None,
            published_at: published.and_then(|s| DateTime::from_timestamp(s, 0)),
        }
    }

    #[tokio::test]
    async fn test_insert_post_then_duplicate() {
        let (db, _, feed_id) = seeded().await;
        let post = new_post(feed_id, "https://blog.example.com/1", Some(1_700_000_000));

        let first = db.insert_post(&post).await.unwrap();
        match first {
            CreatePostOutcome::Created(created) => {
                assert_eq!(created.url, post.url);
                assert_eq!(created.description, None);
                assert_eq!(created.published_at, post.published_at);
            }
            CreatePostOutcome::Duplicate => panic!("first insert reported duplicate"),
        }

        assert_eq!(db.insert_post(&post).await.unwrap(), CreatePostOutcome::Duplicate);
        assert_eq!(db.count_posts().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_detected_across_feeds() {
        let (db, user_id, feed_id) = seeded().await;
        let other = db
            .create_feed("Mirror", "https://mirror.example.com/rss", user_id)
            .await
            .unwrap();

        db.insert_post(&new_post(feed_id, "https://blog.example.com/1", None))
            .await
            .unwrap();
        let outcome = db
            .insert_post(&new_post(other.id, "https://blog.example.com/1", None))
            .await
            .unwrap();

        assert_eq!(outcome, CreatePostOutcome::Duplicate);
        assert!(db.get_posts_for_feed(other.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_posts_for_user_only_followed_newest_first() {
        let (db, user_id, feed_id) = seeded().await;
        let unfollowed = db
            .create_feed("Other", "https://other.example.com/rss", user_id)
            .await
            .unwrap();
        db.create_feed_follow(user_id, feed_id).await.unwrap();

        db.insert_post(&new_post(feed_id, "https://blog.example.com/old", Some(100)))
            .await
            .unwrap();
        db.insert_post(&new_post(feed_id, "https://blog.example.com/undated", None))
            .await
            .unwrap();
        db.insert_post(&new_post(feed_id, "https://blog.example.com/new", Some(200)))
            .await
            .unwrap();
        db.insert_post(&new_post(unfollowed.id, "https://other.example.com/x", Some(300)))
            .await
            .unwrap();

        let urls: Vec<String> = db
            .get_posts_for_user(user_id, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.url)
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://blog.example.com/new",
                "https://blog.example.com/old",
                "https://blog.example.com/undated",
            ]
        );

        assert_eq!(db.get_posts_for_user(user_id, 1).await.unwrap().len(), 1);
    }
}
