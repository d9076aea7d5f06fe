use crate::article::Article;
use crate::error::Error;
use crate::preferences::CacheKey;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use futures::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Result of one coalesced upstream fetch, shared with every waiter.
pub type FetchOutcome = Result<Vec<Article>, Error>;

/// Configuration for fetch coalescing.
#[derive(Clone, Debug)]
pub struct DeduplicationConfig {
    /// How long a waiter sticks around for an in-flight fetch.
    pub wait_timeout: Duration,
    /// Whether coalescing is enabled.
    pub enabled: bool,
}

impl Default for DeduplicationConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::seconds(30),
            enabled: true,
        }
    }
}

type Waiter = Arc<tokio::sync::Mutex<Option<oneshot::Sender<FetchOutcome>>>>;

/// Coalesces concurrent fetches for the same cache key.
///
/// The first caller for a key runs the fetch; callers arriving while it is
/// in flight wait for its outcome instead of hitting the upstream again.
pub struct FetchDeduplicator {
    /// Map of cache keys to in-flight fetches and their waiters.
    pending_fetches: DashMap<CacheKey, (DateTime<Utc>, Vec<Waiter>)>,
    config: DeduplicationConfig,
}

impl FetchDeduplicator {
    pub fn new(config: DeduplicationConfig) -> Self {
        Self {
            pending_fetches: DashMap::new(),
            config,
        }
    }

    /// Run `fetch_fn` for `key`, or wait for the identical fetch already in
    /// flight and share its outcome.
    pub async fn execute<F, Fut>(
        &self,
        key: CacheKey,
        fetch_fn: F,
    ) -> Result<FetchOutcome, DeduplicationError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = FetchOutcome> + Send + 'static,
    {
        if !self.config.enabled {
            return Ok(fetch_fn().await);
        }

        self.cleanup_expired();

        if let Some(mut entry) = self.pending_fetches.get_mut(&key) {
            log::debug!("fetch already in flight for {}", key);

            let (tx, rx) = oneshot::channel();
            let waiter = Arc::new(tokio::sync::Mutex::new(Some(tx)));
            entry.1.push(waiter);
            drop(entry);

            return match tokio::time::timeout(
                self.config
                    .wait_timeout
                    .to_std()
                    .unwrap_or(std::time::Duration::from_secs(30)),
                rx,
            )
            .await
            {
                Ok(Ok(outcome)) => {
                    log::debug!("received shared fetch outcome for {}", key);
                    Ok(outcome)
                }
                Ok(Err(_)) => {
                    log::warn!("in-flight fetch for {} went away", key);
                    Err(DeduplicationError::SenderDropped)
                }
                Err(_) => {
                    log::warn!("timed out waiting on in-flight fetch for {}", key);
                    Err(DeduplicationError::Timeout)
                }
            };
        }

        log::debug!("executing new fetch for {}", key);
        self.pending_fetches
            .insert(key.clone(), (Utc::now(), Vec::new()));

        let outcome = fetch_fn().await;

        if let Some((_, (_, waiters))) = self.pending_fetches.remove(&key) {
            log::debug!("notifying {} waiter(s) for {}", waiters.len(), key);

            for waiter in waiters {
                if let Ok(mut sender_opt) = waiter.try_lock() {
                    if let Some(sender) = sender_opt.take() {
                        let _ = sender.send(outcome.clone());
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Drop in-flight entries older than the wait timeout; their waiters see
    /// a dropped sender.
    fn cleanup_expired(&self) {
        let now = Utc::now();
        let expired_keys: Vec<_> = self
            .pending_fetches
            .iter()
            .filter(|entry| (now - entry.value().0) > self.config.wait_timeout)
            .map(|entry| entry.key().clone())
            .collect();

        for key in expired_keys {
            if let Some((_, (_, waiters))) = self.pending_fetches.remove(&key) {
                log::debug!(
                    "dropping expired in-flight fetch for {} with {} waiter(s)",
                    key,
                    waiters.len()
                );
            }
        }
    }

    pub fn stats(&self) -> DeduplicationStats {
        let pending_count = self.pending_fetches.len();
        let total_waiters = self
            .pending_fetches
            .iter()
            .map(|entry| entry.value().1.len())
            .sum();

        DeduplicationStats {
            pending_fetches: pending_count,
            total_waiters,
        }
    }

    pub fn clear(&self) {
        self.pending_fetches.clear();
        log::info!("fetch deduplicator cleared");
    }
}

/// Occupancy of the in-flight fetch table.
#[derive(Debug)]
pub struct DeduplicationStats {
    pub pending_fetches: usize,
    pub total_waiters: usize,
}

/// Errors a waiter can see while an identical fetch is in flight.
#[derive(Debug, thiserror::Error)]
pub enum DeduplicationError {
    #[error("timed out waiting on an in-flight fetch")]
    Timeout,
    #[error("the in-flight fetch went away without an outcome")]
    SenderDropped,
}

pub type SharedFetchDeduplicator = Arc<FetchDeduplicator>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    fn key(tags: &[&str]) -> CacheKey {
        CacheKey::from_preferences(&tags.iter().map(|t| t.to_string()).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn concurrent_identical_fetches_run_once() {
        let deduplicator = Arc::new(FetchDeduplicator::new(DeduplicationConfig::default()));
        let execution_count = Arc::new(AtomicUsize::new(0));
        let key = key(&["tech"]);

        let mut handles = vec![];
        for _ in 0..5 {
            let deduplicator = deduplicator.clone();
            let key = key.clone();
            let execution_count = execution_count.clone();

            handles.push(tokio::spawn(async move {
                deduplicator
                    .execute(key, move || async move {
                        execution_count.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(StdDuration::from_millis(100)).await;
                        Ok(vec![])
                    })
                    .await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap().unwrap();
        }

        assert_eq!(execution_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_keys_are_not_coalesced() {
        let deduplicator = Arc::new(FetchDeduplicator::new(DeduplicationConfig::default()));
        let execution_count = Arc::new(AtomicUsize::new(0));

        let key1 = key(&["tech"]);
        let key2 = key(&["sports"]);

        let count1 = execution_count.clone();
        let count2 = execution_count.clone();
        let deduplicator1 = deduplicator.clone();
        let deduplicator2 = deduplicator.clone();

        let handle1 = tokio::spawn(async move {
            deduplicator1
                .execute(key1, move || async move {
                    count1.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![])
                })
                .await
        });
        let handle2 = tokio::spawn(async move {
            deduplicator2
                .execute(key2, move || async move {
                    count2.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![])
                })
                .await
        });

        handle1.await.unwrap().unwrap().unwrap();
        handle2.await.unwrap().unwrap().unwrap();

        assert_eq!(execution_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_outcomes_are_shared_too() {
        let deduplicator = Arc::new(FetchDeduplicator::new(DeduplicationConfig::default()));
        let key = key(&["tech"]);

        let outcome = deduplicator
            .execute(key, || async { Err(Error::upstream_unavailable("down")) })
            .await
            .unwrap();

        assert!(outcome.is_err());
    }
}
