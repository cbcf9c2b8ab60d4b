//! Content feed aggregation.
//!
//! A feed page is built from two independently-paginated collections:
//! ratings and posts. Both range queries for a page are issued
//! concurrently and joined; a failure in either aborts the whole page so
//! no partial-success state is ever shown. Results are merged and
//! re-sorted globally by `created_at` descending after every fetch,
//! including load-more appends, because cross-collection interleaving is
//! not preserved by page concatenation.
//!
//! Per-user feed state lives in an in-process store of immutable
//! snapshots, mutated only through initial load, load more, and refresh.
//! Overlap between refresh and load-more is prevented by an advisory
//! in-flight flag per user; the losing request gets a 409 and nothing
//! blocks.

use crate::db::{post_repo, rating_repo};
use crate::error::{AppError, Result};
use crate::models::{ContentItem, Post, Rating};
use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Source of the two paginated sub-collections. The seam exists so the
/// aggregator and store can be exercised without a database.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn ratings_page(&self, limit: i64, offset: i64) -> Result<Vec<Rating>>;
    async fn posts_page(&self, limit: i64, offset: i64) -> Result<Vec<Post>>;
}

pub struct PgFeedSource {
    pool: PgPool,
}

impl PgFeedSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedSource for PgFeedSource {
    async fn ratings_page(&self, limit: i64, offset: i64) -> Result<Vec<Rating>> {
        Ok(rating_repo::fetch_page(&self.pool, limit, offset).await?)
    }

    async fn posts_page(&self, limit: i64, offset: i64) -> Result<Vec<Post>> {
        Ok(post_repo::fetch_page(&self.pool, limit, offset).await?)
    }
}

/// One fetched page of the merged feed.
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub items: Vec<ContentItem>,
    pub has_more: bool,
}

/// Merge both sub-collections and sort by `created_at` descending.
/// The sort is stable, so equal timestamps keep their relative order.
pub fn merge_items(ratings: Vec<Rating>, posts: Vec<Post>) -> Vec<ContentItem> {
    let mut items: Vec<ContentItem> = ratings
        .into_iter()
        .map(ContentItem::Rating)
        .chain(posts.into_iter().map(ContentItem::Post))
        .collect();
    items.sort_by_key(|item| std::cmp::Reverse(item.created_at()));
    items
}

pub struct FeedAggregator<S> {
    source: S,
    page_size: u32,
}

impl<S: FeedSource> FeedAggregator<S> {
    pub fn new(source: S, page_size: u32) -> Self {
        Self { source, page_size }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch page `page` (zero-based) of the merged feed.
    ///
    /// `has_more` assumes either sub-collection could be the exhausted
    /// one: only a full page from both sides promises another page.
    pub async fn fetch_page(&self, page: u32) -> Result<FeedPage> {
        let limit = self.page_size as i64;
        let offset = page as i64 * limit;

        let (ratings, posts) = tokio::try_join!(
            self.source.ratings_page(limit, offset),
            self.source.posts_page(limit, offset),
        )?;

        let has_more = ratings.len() + posts.len() >= 2 * self.page_size as usize;
        debug!(
            page,
            ratings = ratings.len(),
            posts = posts.len(),
            has_more,
            "Fetched feed page"
        );

        Ok(FeedPage {
            items: merge_items(ratings, posts),
            has_more,
        })
    }
}

/// Immutable view of a user's current feed state.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub items: Arc<Vec<ContentItem>>,
    pub has_more: bool,
}

#[derive(Debug)]
struct FeedState {
    items: Arc<Vec<ContentItem>>,
    next_page: u32,
    has_more: bool,
    in_flight: bool,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            next_page: 0,
            has_more: true,
            in_flight: false,
        }
    }
}

pub struct FeedStore<S> {
    aggregator: FeedAggregator<S>,
    states: DashMap<Uuid, FeedState>,
}

/// Holds the per-user in-flight flag for the duration of one feed
/// operation. Released on drop, so the flag cannot leak when the request
/// future is dropped mid-fetch (actix drops handler futures on client
/// disconnect).
struct InFlightGuard<'a> {
    states: &'a DashMap<Uuid, FeedState>,
    user_id: Uuid,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Some(mut state) = self.states.get_mut(&self.user_id) {
            state.in_flight = false;
        }
    }
}

impl<S: FeedSource> FeedStore<S> {
    pub fn new(aggregator: FeedAggregator<S>) -> Self {
        Self {
            aggregator,
            states: DashMap::new(),
        }
    }

    /// Current snapshot, if the user has loaded the feed at least once.
    pub fn snapshot(&self, user_id: Uuid) -> Option<FeedSnapshot> {
        self.states.get(&user_id).filter(|s| s.next_page > 0).map(|s| FeedSnapshot {
            items: s.items.clone(),
            has_more: s.has_more,
        })
    }

    /// Initial load or refresh: re-fetch page 0 and replace the snapshot.
    pub async fn refresh(&self, user_id: Uuid) -> Result<FeedSnapshot> {
        let _guard = self.begin(user_id)?;

        let page = self.aggregator.fetch_page(0).await?;

        let mut state = self.states.entry(user_id).or_default();
        state.items = Arc::new(page.items);
        state.next_page = 1;
        state.has_more = page.has_more;
        Ok(FeedSnapshot {
            items: state.items.clone(),
            has_more: state.has_more,
        })
    }

    /// Fetch the next page, append it, and re-sort the whole list.
    ///
    /// Once a page has come back short from both sides, further calls
    /// return the current snapshot without issuing queries.
    pub async fn load_more(&self, user_id: Uuid) -> Result<FeedSnapshot> {
        if let Some(state) = self.states.get(&user_id) {
            if state.next_page > 0 && !state.has_more {
                return Ok(FeedSnapshot {
                    items: state.items.clone(),
                    has_more: false,
                });
            }
        }

        let _guard = self.begin(user_id)?;

        let next_page = self
            .states
            .get(&user_id)
            .map(|s| s.next_page)
            .unwrap_or(0);

        let page = self.aggregator.fetch_page(next_page).await?;

        let mut state = self.states.entry(user_id).or_default();
        let mut combined: Vec<ContentItem> = state.items.as_ref().clone();
        combined.extend(page.items);
        combined.sort_by_key(|item| std::cmp::Reverse(item.created_at()));
        state.items = Arc::new(combined);
        state.next_page = next_page + 1;
        state.has_more = page.has_more;
        Ok(FeedSnapshot {
            items: state.items.clone(),
            has_more: state.has_more,
        })
    }

    /// Advisory mutual exclusion: claim the per-user in-flight flag or
    /// reject with a conflict. The returned guard releases the flag on
    /// drop, which covers the error path and a request future dropped
    /// mid-fetch alike.
    fn begin(&self, user_id: Uuid) -> Result<InFlightGuard<'_>> {
        let mut state = self.states.entry(user_id).or_default();
        if state.in_flight {
            return Err(AppError::Conflict(
                "A feed operation is already in progress".to_string(),
            ));
        }
        state.in_flight = true;
        drop(state);

        Ok(InFlightGuard {
            states: &self.states,
            user_id,
        })
    }
}
