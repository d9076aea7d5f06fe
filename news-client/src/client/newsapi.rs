use super::HeadlineProvider;
use crate::article::Article;
use crate::config::NewsConfig;
use crate::error::Error;
use async_trait::async_trait;
use serde::Deserialize;
use surf::Client;
use utils::surf_logging::SurfLogging;

const TOP_HEADLINES_URL: &str = "https://newsapi.org/v2/top-headlines";

/// newsapi.org top-headlines client. The credential travels in the
/// `X-Api-Key` header rather than the query string.
pub struct NewsApi {
    http: Client,
    api_key: Option<String>,
    language: String,
}

#[derive(Debug, Deserialize)]
struct HeadlinesPage {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    source: Option<RawSource>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

impl From<RawArticle> for Article {
    fn from(raw: RawArticle) -> Self {
        Self {
            title: raw.title,
            description: raw.description,
            url: raw.url.unwrap_or_default(),
            source: raw.source.and_then(|source| source.name),
        }
    }
}

impl NewsApi {
    pub fn new(config: &NewsConfig) -> Self {
        Self {
            http: Client::new().with(SurfLogging),
            api_key: config.api_key().clone(),
            language: config.language().clone(),
        }
    }

    async fn headlines(&self, extra_query: &str, page_size: usize) -> Result<Vec<Article>, Error> {
        let api_key = self.api_key.as_deref().ok_or_else(Error::missing_api_key)?;
        let url = format!(
            "{}?language={}&pageSize={}{}",
            TOP_HEADLINES_URL, self.language, page_size, extra_query
        );

        let mut response = self
            .http
            .get(&url)
            .header("X-Api-Key", api_key)
            .await?;
        if !response.status().is_success() {
            return Err(Error::request(format!(
                "top-headlines returned {}",
                response.status()
            )));
        }

        let page: HeadlinesPage = response
            .body_json()
            .await
            .map_err(|err| Error::invalid_response(err.to_string()))?;
        Ok(page.articles.into_iter().map(Article::from).collect())
    }
}

#[async_trait]
impl HeadlineProvider for NewsApi {
    fn configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn default_feed(&self, page_size: usize) -> Result<Vec<Article>, Error> {
        self.headlines("", page_size).await
    }

    async fn category(&self, category: &str, page_size: usize) -> Result<Vec<Article>, Error> {
        let extra = format!("&category={}", urlencoding::encode(category));
        self.headlines(&extra, page_size).await
    }
}
