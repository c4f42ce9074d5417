use super::schema::Database;
use super::types::{StoreError, User, UserRow};

impl Database {
    // ========================================================================
    // User Operations
    // ========================================================================

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// `StoreError::Conflict` if the name is already taken.
    pub async fn create_user(&self, name: &str) -> Result<User, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (name, created_at, updated_at)
            VALUES (?, ?, ?)
            RETURNING id, name, created_at, updated_at
        "#,
        )
        .bind(name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::conflict_or(e, format!("user {}", name)))?;

        Ok(row.into_user())
    }

    /// Look up a user by name.
    pub async fn get_user(&self, name: &str) -> Result<User, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, name, created_at, updated_at FROM users WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        row.map(UserRow::into_user)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", name)))
    }

    /// All users, ordered by name.
    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT id, name, created_at, updated_at FROM users ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    /// Delete every user and feed. Follows and posts go with them via `ON DELETE CASCADE`.
    ///
    /// Returns `(users_deleted, feeds_deleted)`.
    pub async fn reset(&self) -> Result<(u64, u64), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Feeds first so the count reflects rows removed here, not by cascade
        let feeds = sqlx::query("DELETE FROM feeds")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let users = sqlx::query("DELETE FROM users")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok((users, feeds))
    }
}
