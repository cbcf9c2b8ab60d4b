//! Pint of the Week result history.
//!
//! A single Redis key holds the whole history array: at most five
//! entries, most recent first, de-duplicated by winner id. Every mutation
//! reads the entire array, computes the new one, and rewrites the key
//! wholesale, so a partially-applied update can never be observed. Saves
//! are serialized behind a mutex; without it two concurrent saves could
//! read the same array and silently lose one entry.

use crate::error::Result;
use crate::models::HistoryEntry;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::warn;

pub const HISTORY_CAP: usize = 5;

/// Storage for the serialized history array. The seam exists so the
/// read-modify-write discipline can be exercised without Redis.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    async fn read(&self) -> Result<Option<String>>;
    async fn write(&self, value: String) -> Result<()>;
}

pub struct RedisBackend {
    conn: ConnectionManager,
    key: String,
}

impl RedisBackend {
    pub fn new(conn: ConnectionManager, key: String) -> Self {
        Self { conn, key }
    }
}

#[async_trait]
impl HistoryBackend for RedisBackend {
    async fn read(&self) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get(&self.key).await?)
    }

    async fn write(&self, value: String) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(&self.key, value).await?;
        Ok(())
    }
}

pub struct HistoryStore<B> {
    backend: B,
    write_lock: Mutex<()>,
}

impl<B: HistoryBackend> HistoryStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn list(&self) -> Result<Vec<HistoryEntry>> {
        match self.backend.read().await? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(entries) => Ok(entries),
                Err(e) => {
                    // A corrupt value is treated as an empty history; the
                    // next save rewrites the key with a valid array.
                    warn!(error = %e, "Discarding unreadable history value");
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }

    /// Persist a snapshot, returning the new history. The whole
    /// read-compute-rewrite runs under the write lock.
    pub async fn save(&self, entry: HistoryEntry) -> Result<Vec<HistoryEntry>> {
        let _lock = self.write_lock.lock().await;

        let current = self.list().await?;
        let updated = push_capped(current, entry);
        self.backend.write(serde_json::to_string(&updated)?).await?;

        Ok(updated)
    }
}

/// Prepend `entry`, dropping any previous entry for the same winner, and
/// truncate to the cap.
pub fn push_capped(mut history: Vec<HistoryEntry>, entry: HistoryEntry) -> Vec<HistoryEntry> {
    history.retain(|e| e.winner.id != entry.winner.id);
    history.insert(0, entry);
    history.truncate(HISTORY_CAP);
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;
    use chrono::Utc;
    use std::sync::Arc;
    use uuid::Uuid;

    fn entry(winner_id: Uuid, analysis: &str) -> HistoryEntry {
        HistoryEntry {
            analysis: analysis.into(),
            social_score: 90,
            winner: Rating {
                id: winner_id,
                created_at: Utc::now(),
                quality: 5,
                price: None,
                exact_price: None,
                message: "".into(),
                image_url: Some("https://cdn.stoutly.co.uk/p.jpg".into()),
                like_count: 0,
                comment_count: 0,
                is_private: false,
                pub_ref: None,
                author: None,
            },
            sharable_image_data: "data".into(),
            date: Utc::now(),
        }
    }

    /// In-memory backend that yields between read and write so an
    /// unserialized save pair would interleave.
    struct MemoryBackend {
        value: std::sync::Mutex<Option<String>>,
    }

    impl MemoryBackend {
        fn new() -> Self {
            Self {
                value: std::sync::Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl HistoryBackend for MemoryBackend {
        async fn read(&self) -> Result<Option<String>> {
            let value = self.value.lock().unwrap().clone();
            tokio::task::yield_now().await;
            Ok(value)
        }

        async fn write(&self, new: String) -> Result<()> {
            tokio::task::yield_now().await;
            *self.value.lock().unwrap() = Some(new);
            Ok(())
        }
    }

    #[test]
    fn sixth_entry_evicts_the_oldest() {
        let mut history = Vec::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let id = Uuid::new_v4();
            ids.push(id);
            history = push_capped(history, entry(id, &format!("e{i}")));
        }
        assert_eq!(history.len(), 5);

        let newest = Uuid::new_v4();
        let history = push_capped(history, entry(newest, "e5"));
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].winner.id, newest);
        // ids[0] was the oldest and must be gone
        assert!(history.iter().all(|e| e.winner.id != ids[0]));
    }

    #[test]
    fn duplicate_winner_replaces_rather_than_duplicates() {
        let id = Uuid::new_v4();
        let history = push_capped(Vec::new(), entry(id, "first"));
        let history = push_capped(history, entry(Uuid::new_v4(), "other"));
        let history = push_capped(history, entry(id, "second"));

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].winner.id, id);
        assert_eq!(history[0].analysis, "second");
    }

    #[test]
    fn most_recent_first() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let history = push_capped(push_capped(Vec::new(), entry(a, "a")), entry(b, "b"));
        assert_eq!(history[0].winner.id, b);
        assert_eq!(history[1].winner.id, a);
    }

    #[tokio::test]
    async fn concurrent_saves_both_land() {
        let store = Arc::new(HistoryStore::new(MemoryBackend::new()));
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let first = {
            let store = store.clone();
            let e = entry(a, "a");
            tokio::spawn(async move { store.save(e).await })
        };
        let second = {
            let store = store.clone();
            let e = entry(b, "b");
            tokio::spawn(async move { store.save(e).await })
        };
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        let entries = store.list().await.unwrap();
        assert_eq!(entries.len(), 2);
        let ids: Vec<Uuid> = entries.iter().map(|e| e.winner.id).collect();
        assert!(ids.contains(&a) && ids.contains(&b));
    }
}
