use chrono::Utc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::store::FeedStore;
use crate::feed::{fetch_feed, normalize_pub_date, FeedItem, FetchError};
use crate::storage::{DatabaseError, NewPost};

/// Why an ingestion cycle stopped early.
///
/// Only [`CycleError::MarkFetched`] can occur after posts were written.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Could not query for the next feed
    #[error("Failed to select next feed: {0}")]
    Select(#[source] DatabaseError),

    /// There are no feeds at all
    #[error("No feeds to fetch")]
    NoFeeds,

    /// Fetching or parsing the selected feed failed; the feed stays unmarked
    #[error("Failed to fetch feed {name} ({url}): {source}")]
    Fetch {
        feed_id: Uuid,
        name: String,
        url: String,
        #[source]
        source: FetchError,
    },

    /// Posts were processed but the feed could not be marked fetched
    #[error("Failed to mark feed {feed_id} as fetched: {source}")]
    MarkFetched {
        feed_id: Uuid,
        #[source]
        source: DatabaseError,
    },
}

/// Outcome of one successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub feed_id: Uuid,
    pub feed_name: String,
    /// Items in the fetched document
    pub items: usize,
    /// Posts inserted
    pub created: usize,
    /// Inserts rejected by the store (duplicates included)
    pub failed_inserts: usize,
    /// Items stored without a publication date
    pub unparsed_dates: usize,
}

/// Run one ingestion pass over the feed most overdue for refresh.
///
/// Selects the feed, fetches it, inserts one post per item, then marks the
/// feed fetched at the current time. Per-item problems (an unparseable
/// `pubDate`, a rejected insert) are logged and skipped; they never abort
/// the cycle or prevent the feed from being marked.
///
/// # Errors
///
/// See [`CycleError`]. A fetch error leaves `last_fetched_at` untouched so
/// the same feed is selected again next time.
pub async fn run_once<S>(
    store: &S,
    client: &reqwest::Client,
    cancel: &CancellationToken,
) -> Result<CycleReport, CycleError>
where
    S: FeedStore + ?Sized,
{
    let feed = store
        .select_next_feed_due()
        .await
        .map_err(CycleError::Select)?
        .ok_or(CycleError::NoFeeds)?;

    tracing::debug!(feed_id = %feed.id, name = %feed.name, url = %feed.url, "Fetching feed");

    let doc = match fetch_feed(client, &feed.url, cancel).await {
        Ok(doc) => doc,
        Err(source) => {
            return Err(CycleError::Fetch {
                feed_id: feed.id,
                name: feed.name,
                url: feed.url,
                source,
            })
        }
    };

    let mut report = CycleReport {
        feed_id: feed.id,
        feed_name: feed.name.clone(),
        items: doc.items.len(),
        created: 0,
        failed_inserts: 0,
        unparsed_dates: 0,
    };

    for item in doc.items {
        let post = build_post(item, feed.id, &doc.title, &mut report);
        match store.create_post(&post).await {
            Ok(()) => report.created += 1,
            Err(e) => {
                report.failed_inserts += 1;
                tracing::warn!(
                    feed_id = %feed.id,
                    url = %post.url,
                    duplicate = e.is_duplicate(),
                    error = %e,
                    "Failed to create post"
                );
            }
        }
    }

    store
        .mark_feed_fetched(feed.id, Utc::now())
        .await
        .map_err(|source| CycleError::MarkFetched {
            feed_id: feed.id,
            source,
        })?;

    Ok(report)
}

fn build_post(item: FeedItem, feed_id: Uuid, channel: &str, report: &mut CycleReport) -> NewPost {
    let published_at = match normalize_pub_date(&item.pub_date, channel) {
        Ok(at) => Some(at),
        Err(e) => {
            report.unparsed_dates += 1;
            tracing::warn!(
                feed_id = %feed_id,
                raw = %e.raw,
                channel = %e.channel,
                "Could not parse publication date; storing post without one"
            );
            None
        }
    };

    NewPost {
        id: Uuid::new_v4(),
        title: item.title,
        url: item.link,
        description: Some(item.description).filter(|d| !d.is_empty()),
        published_at,
        feed_id,
    }
}
