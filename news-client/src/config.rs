use chrono::Duration;
use getset::Getters;
use std::time::Duration as StdDuration;

/// Client configuration.
///
/// Defaults follow the upstream operational limits: a 5 minute TTL and
/// refresh cadence, a fan-out cap of 5 categories, 20 articles for the
/// default feed and 10 per category.
#[derive(Clone, Debug, Getters)]
#[get = "pub"]
pub struct NewsConfig {
    api_key: Option<String>,
    ttl: Duration,
    refresh_interval: StdDuration,
    max_categories: usize,
    default_page_size: usize,
    category_page_size: usize,
    language: String,
    query_timeout: StdDuration,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            ttl: Duration::minutes(5),
            refresh_interval: StdDuration::from_secs(5 * 60),
            max_categories: 5,
            default_page_size: 20,
            category_page_size: 10,
            language: "en".to_string(),
            query_timeout: StdDuration::from_secs(10),
        }
    }
}

impl NewsConfig {
    /// Configuration with the credential taken from `NEWS_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("NEWS_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            ..Self::default()
        }
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    pub fn ttl_of(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn refresh_interval_of(mut self, interval: StdDuration) -> Self {
        self.refresh_interval = interval;
        self
    }
}
