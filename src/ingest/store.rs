//! Persistence port for the ingestion pipeline.
//!
//! The cycle only needs three operations, so it depends on this trait
//! rather than on [`Database`] directly. Tests substitute an in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::storage::{Database, DatabaseError, Feed, NewPost};

/// Storage operations used by the ingestion cycle
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// The feed most overdue for refresh: never-fetched first, then oldest
    /// `last_fetched_at`, ties broken by creation time then id.
    async fn select_next_feed_due(&self) -> Result<Option<Feed>, DatabaseError>;

    /// Set the feed's `last_fetched_at` (and `updated_at`) to `at`
    async fn mark_feed_fetched(&self, feed_id: Uuid, at: DateTime<Utc>)
        -> Result<(), DatabaseError>;

    /// Insert one post. A URL already stored yields [`DatabaseError::Duplicate`].
    async fn create_post(&self, post: &NewPost) -> Result<(), DatabaseError>;
}

#[async_trait]
impl FeedStore for Database {
    async fn select_next_feed_due(&self) -> Result<Option<Feed>, DatabaseError> {
        Database::select_next_feed_due(self).await
    }

    async fn mark_feed_fetched(
        &self,
        feed_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        Database::mark_feed_fetched(self, feed_id, at).await
    }

    async fn create_post(&self, post: &NewPost) -> Result<(), DatabaseError> {
        Database::create_post(self, post).await.map(|_| ())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory [`FeedStore`] that records every call.

    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, RwLock};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum StoreCall {
        SelectNextFeedDue,
        MarkFeedFetched(Uuid, DateTime<Utc>),
        CreatePost(NewPost),
    }

    #[derive(Default)]
    pub struct RecordingStore {
        feed: Arc<RwLock<Option<Feed>>>,
        urls: Arc<RwLock<HashSet<String>>>,
        calls: Arc<RwLock<Vec<StoreCall>>>,
        fail_select: bool,
        fail_mark: bool,
    }

    impl RecordingStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Serve `feed` from every selection
        pub fn with_feed(self, feed: Feed) -> Self {
            *self.feed.write().unwrap() = Some(feed);
            self
        }

        /// Pre-populate a stored post URL so inserting it again is a duplicate
        pub fn with_existing_url(self, url: &str) -> Self {
            self.urls.write().unwrap().insert(url.to_string());
            self
        }

        pub fn failing_select(mut self) -> Self {
            self.fail_select = true;
            self
        }

        pub fn failing_mark(mut self) -> Self {
            self.fail_mark = true;
            self
        }

        pub fn calls(&self) -> Vec<StoreCall> {
            self.calls.read().unwrap().clone()
        }

        pub fn created_posts(&self) -> Vec<NewPost> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    StoreCall::CreatePost(p) => Some(p),
                    _ => None,
                })
                .collect()
        }

        pub fn marks(&self) -> Vec<(Uuid, DateTime<Utc>)> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    StoreCall::MarkFeedFetched(id, at) => Some((id, at)),
                    _ => None,
                })
                .collect()
        }

        pub fn select_count(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, StoreCall::SelectNextFeedDue))
                .count()
        }
    }

    #[async_trait]
    impl FeedStore for RecordingStore {
        async fn select_next_feed_due(&self) -> Result<Option<Feed>, DatabaseError> {
            self.calls.write().unwrap().push(StoreCall::SelectNextFeedDue);
            if self.fail_select {
                return Err(DatabaseError::Other(sqlx::Error::PoolClosed));
            }
            Ok(self.feed.read().unwrap().clone())
        }

        async fn mark_feed_fetched(
            &self,
            feed_id: Uuid,
            at: DateTime<Utc>,
        ) -> Result<(), DatabaseError> {
            self.calls
                .write()
                .unwrap()
                .push(StoreCall::MarkFeedFetched(feed_id, at));
            if self.fail_mark {
                return Err(DatabaseError::NotFound(format!("feed {}", feed_id)));
            }
            Ok(())
        }

        async fn create_post(&self, post: &NewPost) -> Result<(), DatabaseError> {
            self.calls
                .write()
                .unwrap()
                .push(StoreCall::CreatePost(post.clone()));
            if !self.urls.write().unwrap().insert(post.url.clone()) {
                return Err(DatabaseError::Duplicate(format!(
                    "UNIQUE constraint failed: posts.url ({})",
                    post.url
                )));
            }
            Ok(())
        }
    }
}
