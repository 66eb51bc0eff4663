use chrono::Utc;
use uuid::Uuid;

use super::schema::Database;
use super::types::{DatabaseError, NewPost, Post};

const POST_COLUMNS: &str =
    "p.id, p.created_at, p.updated_at, p.title, p.url, p.description, p.published_at, p.feed_id";

impl Database {
    // ========================================================================
    // Post Operations
    // ========================================================================

    /// Insert one ingested item.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Duplicate`] if a post with the same URL is
    /// already stored (the usual case when a feed is re-fetched).
    pub async fn create_post(&self, post: &NewPost) -> Result<Post, DatabaseError> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, created_at, updated_at, title, url, description, published_at, feed_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, created_at, updated_at, title, url, description, published_at, feed_id
        "#,
        )
        .bind(post.id)
        .bind(now)
        .bind(now)
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.description)
        .bind(post.published_at)
        .bind(post.feed_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Newest posts across every feed `user_id` follows.
    ///
    /// Posts without a publication date sort after dated ones.
    pub async fn get_posts_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Post>, DatabaseError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            r#"
                SELECT {POST_COLUMNS}
                FROM posts p
                JOIN feed_follows ff ON ff.feed_id = p.feed_id
                WHERE ff.user_id = ?
                ORDER BY p.published_at DESC NULLS LAST, p.created_at DESC
                LIMIT ?
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    /// All posts stored for one feed, newest first
    pub async fn get_posts_for_feed(&self, feed_id: Uuid) -> Result<Vec<Post>, DatabaseError> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            r#"
                SELECT {POST_COLUMNS}
                FROM posts p
                WHERE p.feed_id = ?
                ORDER BY p.published_at DESC NULLS LAST, p.created_at DESC
            "#
        ))
        .bind(feed_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use crate::storage::{Database, Feed, NewPost, User};

    async fn setup() -> (Database, User, Feed) {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.create_user("reader").await.unwrap();
        let feed = db
            .create_feed("News", "https://news.example.com/rss", user.id)
            .await
            .unwrap();
        (db, user, feed)
    }

    fn new_post(feed: &Feed, url: &str, day: Option<u32>) -> NewPost {
        NewPost {
            id: Uuid::new_v4(),
            title: format!("Post {}", url),
            url: url.to_string(),
            description: Some("body".to_string()),
            published_at: day.map(|d| Utc.with_ymd_and_hms(2024, 3, d, 9, 0, 0).unwrap()),
            feed_id: feed.id,
        }
    }

    #[tokio::test]
    async fn test_create_post_round_trips_fields() {
        let (db, _, feed) = setup().await;
        let input = new_post(&feed, "https://news.example.com/1", Some(5));

        let stored = db.create_post(&input).await.unwrap();
        assert_eq!(stored.id, input.id);
        assert_eq!(stored.url, input.url);
        assert_eq!(stored.description.as_deref(), Some("body"));
        assert_eq!(stored.published_at, input.published_at);
    }

    #[tokio::test]
    async fn test_duplicate_post_url_is_duplicate() {
        let (db, _, feed) = setup().await;
        db.create_post(&new_post(&feed, "https://news.example.com/1", None))
            .await
            .unwrap();

        let err = db
            .create_post(&new_post(&feed, "https://news.example.com/1", None))
            .await
            .unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(db.get_posts_for_feed(feed.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_post_without_published_at_is_stored() {
        let (db, _, feed) = setup().await;
        let stored = db
            .create_post(&new_post(&feed, "https://news.example.com/undated", None))
            .await
            .unwrap();
        assert!(stored.published_at.is_none());
    }

    #[tokio::test]
    async fn test_posts_for_user_only_followed_newest_first() {
        let (db, user, feed) = setup().await;
        let other = db
            .create_feed("Other", "https://other.example.com/rss", user.id)
            .await
            .unwrap();
        db.create_feed_follow(user.id, feed.id).await.unwrap();

        db.create_post(&new_post(&feed, "https://news.example.com/old", Some(1)))
            .await
            .unwrap();
        db.create_post(&new_post(&feed, "https://news.example.com/undated", None))
            .await
            .unwrap();
        db.create_post(&new_post(&feed, "https://news.example.com/new", Some(20)))
            .await
            .unwrap();
        db.create_post(&new_post(&other, "https://other.example.com/x", Some(25)))
            .await
            .unwrap();

        let urls: Vec<String> = db
            .get_posts_for_user(user.id, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.url)
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://news.example.com/new",
                "https://news.example.com/old",
                "https://news.example.com/undated",
            ]
        );

        assert_eq!(db.get_posts_for_user(user.id, 2).await.unwrap().len(), 2);
    }
}
