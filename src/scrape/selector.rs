use chrono::{DateTime, SubsecRound, Utc};

use crate::storage::{Feed, PostStore, StoreError};

/// Select and claim the feed most in need of a refresh.
///
/// Candidates come from [`PostStore::list_feeds_by_staleness`]: never-fetched
/// feeds first, then oldest `last_fetched_at`, ties by id. The first candidate
/// whose claim succeeds is returned with `last_fetched_at` already stamped to
/// `now`; a candidate claimed concurrently by another worker is skipped.
///
/// The claim happens *before* the feed is fetched. A slow or failing fetch
/// therefore cannot make the same feed due again on the next tick, at the cost
/// of a failed feed waiting a full rotation before it is retried. It is a
/// logical claim persisted in the store, not a lock.
///
/// Returns `Ok(None)` when there is nothing to claim (no feeds, or every
/// candidate lost its race), which callers treat as an idle tick.
pub async fn next_due<S: PostStore + ?Sized>(
    store: &S,
    now: DateTime<Utc>,
) -> Result<Option<Feed>, StoreError> {
    // Claims are persisted at millisecond resolution
    let now = now.trunc_subsecs(3);
    let candidates = store.list_feeds_by_staleness().await?;

    for feed in candidates {
        if store.claim_feed(&feed, now).await? {
            let stamped = feed.last_fetched_at.map_or(now, |prev| prev.max(now));
            tracing::debug!(feed_id = feed.id, feed = %feed.url, "Claimed feed");
            return Ok(Some(Feed {
                last_fetched_at: Some(stamped),
                ..feed
            }));
        }
        tracing::debug!(
            feed_id = feed.id,
            "Feed claimed by another worker, trying next candidate"
        );
    }

    Ok(None)
}
