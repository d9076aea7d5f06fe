mod article;
mod cache;
mod client;
mod config;
mod deduplication;
mod error;
mod preferences;
mod refresher;


pub use article::{dedupe_articles, Article};
pub use cache::{CacheStats, CachedFeed, NewsCache, SharedNewsCache};
pub use client::{HeadlineProvider, NewsApi};
pub use config::NewsConfig;
pub use deduplication::{
    DeduplicationConfig, DeduplicationStats, FetchDeduplicator, FetchOutcome,
    SharedFetchDeduplicator,
};
pub use error::{Error, ErrorKind};
pub use preferences::{CacheKey, DEFAULT_FEED_KEY};
pub use refresher::spawn_refresher;

use chrono::Duration;
use futures::future::join_all;
use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

const STALE_WARNING: &str = "using stale cache due to fetch error";

/// What a feed request resolves to: the article list, whether it came from
/// the cache, and a warning when stale data was served.
#[derive(Clone, Debug, Serialize)]
pub struct NewsResponse {
    pub news: Vec<Article>,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Preference-keyed news aggregation client.
///
/// Feeds are cached per canonical preference key and served from cache while
/// inside the TTL. A miss or an expired entry triggers a coalesced upstream
/// fetch; when that fetch fails, the last good entry is served instead of the
/// error as long as one exists.
#[derive(Clone)]
pub struct NewsClient {
    provider: Arc<dyn HeadlineProvider>,
    cache: SharedNewsCache,
    deduplicator: SharedFetchDeduplicator,
    config: NewsConfig,
}

impl NewsClient {
    pub fn new(config: NewsConfig) -> Self {
        let provider = Arc::new(NewsApi::new(&config));
        Self::with_provider(config, provider)
    }

    /// Client backed by a caller-supplied upstream, the seam used by tests.
    pub fn with_provider(config: NewsConfig, provider: Arc<dyn HeadlineProvider>) -> Self {
        Self {
            provider,
            cache: Arc::new(NewsCache::new()),
            deduplicator: Arc::new(FetchDeduplicator::new(DeduplicationConfig::default())),
            config,
        }
    }

    /// Client configured from the environment (`NEWS_API_KEY`).
    pub fn from_env() -> Self {
        Self::new(NewsConfig::from_env())
    }

    /// Serve the feed for `preferences` with the configured TTL.
    pub async fn news(&self, preferences: &[String]) -> Result<NewsResponse, Error> {
        self.news_with_ttl(preferences, *self.config.ttl()).await
    }

    /// Serve the feed for `preferences`, treating entries older than `ttl`
    /// as stale.
    pub async fn news_with_ttl(
        &self,
        preferences: &[String],
        ttl: Duration,
    ) -> Result<NewsResponse, Error> {
        let key = CacheKey::from_preferences(preferences);

        if let Some(entry) = self.cache.get_fresh(&key, ttl) {
            debug!("fresh cache hit for {}", key);
            return Ok(NewsResponse {
                news: entry.articles,
                cached: true,
                warning: None,
            });
        }

        match self.fetch_and_store(key.clone(), preferences).await {
            Ok(articles) => Ok(NewsResponse {
                news: articles,
                cached: false,
                warning: None,
            }),
            Err(err) => match self.cache.get(&key) {
                Some(stale) => {
                    warn!("serving stale feed for {}: {}", key, err);
                    Ok(NewsResponse {
                        news: stale.articles,
                        cached: true,
                        warning: Some(STALE_WARNING.to_string()),
                    })
                }
                None => Err(err),
            },
        }
    }

    /// Case-insensitive keyword search over the caller's feed. The feed is
    /// served through the normal cache path first.
    pub async fn search(
        &self,
        preferences: &[String],
        keyword: &str,
    ) -> Result<Vec<Article>, Error> {
        let keyword = keyword.to_lowercase();
        let response = self.news(preferences).await?;

        Ok(response
            .news
            .into_iter()
            .filter(|article| {
                article
                    .title
                    .as_deref()
                    .is_some_and(|title| title.to_lowercase().contains(&keyword))
                    || article
                        .description
                        .as_deref()
                        .is_some_and(|description| description.to_lowercase().contains(&keyword))
            })
            .collect())
    }

    /// Re-fetch `preferences` and replace the entry at `key`, ignoring the
    /// TTL. Returns whether the refresh succeeded.
    pub async fn force_refresh(&self, key: &CacheKey, preferences: &[String]) -> bool {
        match self.fetch_and_store(key.clone(), preferences).await {
            Ok(_) => true,
            Err(err) => {
                log::error!("refresh of {} failed: {}", key, err);
                false
            }
        }
    }

    /// One refresher pass: force-refresh every resident key. Per-key
    /// failures are logged and do not stop the pass.
    pub async fn refresh_resident(&self) {
        let keys = self.cache.keys();
        log::info!("refreshing {} cached feed(s)", keys.len());

        for key in keys {
            let preferences = key.preferences();
            if !self.force_refresh(&key, &preferences).await {
                warn!("background refresh failed for {}", key);
            }
        }
    }

    /// Start the keep-warm refresher with the configured interval. The loop
    /// runs for the lifetime of the process.
    pub fn start_refresher(&self) -> JoinHandle<()> {
        spawn_refresher(self.clone(), *self.config.refresh_interval())
    }

    /// Keys currently resident in the cache.
    pub fn cached_keys(&self) -> Vec<CacheKey> {
        self.cache.keys()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats(*self.config.ttl())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn config(&self) -> &NewsConfig {
        &self.config
    }

    /// Coalesced fetch with write-through for one key.
    async fn fetch_and_store(
        &self,
        key: CacheKey,
        preferences: &[String],
    ) -> Result<Vec<Article>, Error> {
        if !self.provider.configured() {
            return Err(Error::missing_api_key());
        }

        let provider = Arc::clone(&self.provider);
        let cache = Arc::clone(&self.cache);
        let config = self.config.clone();
        let preferences = preferences.to_vec();
        let fetch_key = key.clone();

        let outcome = self
            .deduplicator
            .execute(key, move || async move {
                let articles = fetch_feed(provider.as_ref(), &config, &preferences).await?;
                cache.put(fetch_key, articles.clone());
                Ok(articles)
            })
            .await;

        match outcome {
            Ok(result) => result,
            Err(err) => Err(Error::upstream_unavailable(err.to_string())),
        }
    }
}

/// Fan-out fetch: one query per preference tag (capped), or the default feed
/// for an empty set. Individual query failures only cost their contribution;
/// the fetch fails when no query succeeded at all.
async fn fetch_feed(
    provider: &dyn HeadlineProvider,
    config: &NewsConfig,
    preferences: &[String],
) -> FetchOutcome {
    let mut queries = Vec::new();
    if preferences.is_empty() {
        queries.push(run_query(provider, config, None));
    } else {
        if preferences.len() > *config.max_categories() {
            debug!(
                "capping fan-out to the first {} of {} preferences",
                config.max_categories(),
                preferences.len()
            );
        }
        for category in preferences.iter().take(*config.max_categories()) {
            queries.push(run_query(provider, config, Some(category.as_str())));
        }
    }
    let issued = queries.len();

    let mut articles = Vec::new();
    let mut failures = 0;
    for result in join_all(queries).await {
        match result {
            Ok(batch) => articles.extend(batch),
            Err(err) => {
                warn!("headline query failed: {}", err);
                failures += 1;
            }
        }
    }

    if failures == issued {
        return Err(Error::upstream_unavailable(format!(
            "all {} headline queries failed",
            issued
        )));
    }

    Ok(dedupe_articles(articles))
}

/// One upstream query, bounded by the configured per-query timeout.
async fn run_query(
    provider: &dyn HeadlineProvider,
    config: &NewsConfig,
    category: Option<&str>,
) -> Result<Vec<Article>, Error> {
    let query = match category {
        None => provider.default_feed(*config.default_page_size()),
        Some(name) => provider.category(name, *config.category_page_size()),
    };

    match tokio::time::timeout(*config.query_timeout(), query).await {
        Ok(result) => result,
        Err(_) => Err(Error::request(format!(
            "headline query timed out after {:?}",
            config.query_timeout()
        ))),
    }
}
