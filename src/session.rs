//! Per-user search session cache
//!
//! Remembers the most recent result set of every user so that a later button
//! press can be resolved back to full track metadata. Process-lifetime only:
//! no TTL, no eviction, a newer search simply replaces the older one.

use crate::media::Track;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Result set of a single search, keyed by track id
type ResultSet = HashMap<String, Track>;

/// Lock-guarded map of user id to their latest result set
#[derive(Debug, Default)]
pub struct SessionCache {
    sessions: RwLock<HashMap<i64, ResultSet>>,
}

impl SessionCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the user's result set with `results`.
    ///
    /// Duplicate ids collapse to the last occurrence.
    pub async fn store(&self, user_id: i64, results: &[Track]) {
        let set: ResultSet = results
            .iter()
            .map(|track| (track.id.clone(), track.clone()))
            .collect();

        debug!(user_id, tracks = set.len(), "Storing search session");
        self.sessions.write().await.insert(user_id, set);
    }

    /// Look up a track in the user's current result set
    pub async fn fetch(&self, user_id: i64, track_id: &str) -> Option<Track> {
        self.sessions
            .read()
            .await
            .get(&user_id)
            .and_then(|set| set.get(track_id))
            .cloned()
    }

    #[cfg(test)]
    pub(crate) async fn user_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn track(id: &str, title: &str) -> Track {
        Track::new(id, title, 200)
    }

    #[tokio::test]
    async fn test_fetch_unknown_user() {
        let cache = SessionCache::new();
        assert!(cache.fetch(1, "a").await.is_none());
    }

    #[tokio::test]
    async fn test_new_search_supersedes_previous() {
        let cache = SessionCache::new();
        cache.store(1, &[track("a", "A"), track("b", "B")]).await;
        cache.store(1, &[track("c", "C")]).await;

        assert!(cache.fetch(1, "a").await.is_none());
        assert!(cache.fetch(1, "b").await.is_none());
        assert_eq!(cache.fetch(1, "c").await, Some(track("c", "C")));
    }

    #[tokio::test]
    async fn test_duplicate_ids_keep_last() {
        let cache = SessionCache::new();
        cache
            .store(1, &[track("a", "First"), track("b", "B"), track("a", "Second")])
            .await;

        let found = cache.fetch(1, "a").await.map(|t| t.title);
        assert_eq!(found.as_deref(), Some("Second"));
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let cache = SessionCache::new();
        cache.store(1, &[track("a", "A")]).await;
        cache.store(2, &[track("b", "B")]).await;

        assert!(cache.fetch(1, "b").await.is_none());
        assert!(cache.fetch(2, "a").await.is_none());
        assert_eq!(cache.user_count().await, 2);
    }

    #[tokio::test]
    async fn test_fetch_is_idempotent() {
        let cache = SessionCache::new();
        cache.store(7, &[track("a", "A")]).await;

        let first = cache.fetch(7, "a").await;
        for _ in 0..3 {
            assert_eq!(cache.fetch(7, "a").await, first);
        }
    }

    #[tokio::test]
    async fn test_concurrent_store_and_fetch() {
        let cache = Arc::new(SessionCache::new());
        let mut handles = Vec::new();

        for i in 0..32_i64 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let user = i % 4;
                let id = format!("t{i}");
                cache.store(user, &[track(&id, "T")]).await;
                // Either our own set or a later writer's set is visible, never a partial one
                if let Some(found) = cache.fetch(user, &id).await {
                    assert_eq!(found.id, id);
                }
            }));
        }

        for handle in handles {
            handle.await.expect("task panicked");
        }
        assert_eq!(cache.user_count().await, 4);
    }
}
