mod newsapi;

pub use newsapi::NewsApi;

use crate::article::Article;
use crate::error::Error;
use async_trait::async_trait;

/// An upstream headline source.
///
/// Production code talks to newsapi.org through [`NewsApi`]; tests substitute
/// their own implementation.
#[async_trait]
pub trait HeadlineProvider: Send + Sync {
    /// Whether a credential is present. Fetches are refused without one.
    fn configured(&self) -> bool;

    /// Top headlines of the default feed.
    async fn default_feed(&self, page_size: usize) -> Result<Vec<Article>, Error>;

    /// Top headlines for a single category.
    async fn category(&self, category: &str, page_size: usize) -> Result<Vec<Article>, Error>;
}
