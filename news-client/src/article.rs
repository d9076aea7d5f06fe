use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single news article as served to callers. The URL is the article's
/// identity; upstream payloads may omit any of the other fields.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Article {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Drops articles without a URL and collapses duplicates, keeping the first
/// occurrence per URL. Order is otherwise preserved.
pub fn dedupe_articles(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| !article.url.is_empty() && seen.insert(article.url.clone()))
        .collect()
}
