use chrono::Utc;
use uuid::Uuid;

use super::schema::Database;
use super::types::{DatabaseError, FeedFollow};

impl Database {
    // ========================================================================
    // Follow Operations
    // ========================================================================

    /// Subscribe `user_id` to `feed_id`, returning the follow with both names
    /// resolved.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Duplicate`] if the user already follows the feed.
    pub async fn create_feed_follow(
        &self,
        user_id: Uuid,
        feed_id: Uuid,
    ) -> Result<FeedFollow, DatabaseError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO feed_follows (id, created_at, updated_at, user_id, feed_id)
            VALUES (?, ?, ?, ?, ?)
        "#,
        )
        .bind(id)
        .bind(now)
        .bind(now)
        .bind(user_id)
        .bind(feed_id)
        .execute(&mut *tx)
        .await?;

        let follow = sqlx::query_as::<_, FeedFollow>(
            r#"
                SELECT ff.id, ff.created_at, ff.updated_at, ff.user_id, ff.feed_id,
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
        Ok(follow)
    }

    /// Every feed `user_id` follows, by feed name
    pub async fn get_feed_follows_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FeedFollow>, DatabaseError> {
        let follows = sqlx::query_as::<_, FeedFollow>(
            r#"
                SELECT ff.id, ff.created_at, ff.updated_at, ff.user_id, ff.feed_id,
                       u.name AS user_name, f.name AS feed_name
                FROM feed_follows ff
                JOIN users u ON u.id = ff.user_id
                JOIN feeds f ON f.id = ff.feed_id
                WHERE ff.user_id = ?
                ORDER BY f.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(follows)
    }

    /// Drop the user's follow of the feed at `feed_url`. Returns rows removed
    /// (0 if the user was not following it).
    pub async fn delete_feed_follow(
        &self,
        user_id: Uuid,
        feed_url: &str,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            DELETE FROM feed_follows
            WHERE user_id = ?
              AND feed_id IN (SELECT id FROM feeds WHERE url = ?)
        "#,
        )
        .bind(user_id)
        .bind(feed_url)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
