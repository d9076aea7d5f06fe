use std::fmt;

/// Key under which the default feed (no preferences) is cached.
pub const DEFAULT_FEED_KEY: &str = "::all::";

/// Canonical cache key for a preference set.
///
/// Tags are lower-cased, sorted and deduplicated before being encoded, so
/// two sets that differ only in order or casing share a key. The encoding is
/// reversible: the background refresher recovers the preference list from a
/// resident key via [`CacheKey::preferences`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn from_preferences(preferences: &[String]) -> Self {
        if preferences.is_empty() {
            return Self(DEFAULT_FEED_KEY.to_string());
        }

        let mut tags: Vec<String> = preferences
            .iter()
            .map(|tag| tag.to_lowercase())
            .collect();
        tags.sort();
        tags.dedup();

        // a list of strings always serializes
        Self(serde_json::to_string(&tags).expect("serialize tag list"))
    }

    /// The preference set this key encodes.
    pub fn preferences(&self) -> Vec<String> {
        if self.0 == DEFAULT_FEED_KEY {
            return Vec::new();
        }

        match serde_json::from_str(&self.0) {
            Ok(tags) => tags,
            Err(err) => {
                log::warn!("unparseable cache key {}: {}", self.0, err);
                Vec::new()
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
