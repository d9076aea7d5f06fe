use crate::article::Article;
use crate::preferences::CacheKey;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;

/// A cached feed for one preference key. Replaced wholesale on refresh,
/// never updated in place.
#[derive(Clone, Debug)]
pub struct CachedFeed {
    pub articles: Vec<Article>,
    pub created_at: DateTime<Utc>,
}

impl CachedFeed {
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            articles,
            created_at: Utc::now(),
        }
    }

    /// Whether the entry is still inside its time-to-live window.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        Utc::now() - self.created_at < ttl
    }
}

/// In-memory feed cache keyed by canonical preference key.
///
/// Entries live for the lifetime of the process; stale entries stay resident
/// so they can back the stale-on-error fallback.
pub struct NewsCache {
    entries: DashMap<CacheKey, CachedFeed>,
}

impl NewsCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Entry for `key` regardless of freshness.
    pub fn get(&self, key: &CacheKey) -> Option<CachedFeed> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Entry for `key` only when it is inside `ttl`.
    pub fn get_fresh(&self, key: &CacheKey, ttl: Duration) -> Option<CachedFeed> {
        self.get(key).filter(|entry| entry.is_fresh(ttl))
    }

    pub fn put(&self, key: CacheKey, articles: Vec<Article>) {
        log::debug!("caching {} article(s) under {}", articles.len(), key);
        self.entries.insert(key, CachedFeed::new(articles));
    }

    /// Snapshot of resident keys, used by the background refresher.
    pub fn keys(&self) -> Vec<CacheKey> {
        self.entries
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
        log::info!("news cache cleared");
    }

    pub fn stats(&self, ttl: Duration) -> CacheStats {
        let total_entries = self.entries.len();
        let fresh_entries = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_fresh(ttl))
            .count();

        CacheStats {
            total_entries,
            fresh_entries,
            stale_entries: total_entries - fresh_entries,
        }
    }
}

impl Default for NewsCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache occupancy, split by freshness against the configured TTL.
#[derive(Clone, Debug, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub stale_entries: usize,
}

pub type SharedNewsCache = Arc<NewsCache>;
