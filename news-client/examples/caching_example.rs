use news_client::{NewsClient, NewsConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    // Needs NEWS_API_KEY in the environment
    let client = NewsClient::new(NewsConfig::from_env());

    let preferences = vec!["technology".to_string(), "business".to_string()];

    // First fetch (will be cached)
    let start = std::time::Instant::now();
    let first = client.news(&preferences).await?;
    println!(
        "First fetch took {:?} ({} articles, cached: {})",
        start.elapsed(),
        first.news.len(),
        first.cached
    );

    // Second fetch (should come from cache)
    let start = std::time::Instant::now();
    let second = client.news(&preferences).await?;
    println!(
        "Second fetch took {:?} ({} articles, cached: {})",
        start.elapsed(),
        second.news.len(),
        second.cached
    );

    println!("Cache stats: {:?}", client.cache_stats());
    for key in client.cached_keys() {
        println!("Resident key: {}", key);
    }

    // Keyword search over the cached feed
    let matched = client.search(&preferences, "market").await?;
    println!("{} article(s) mention 'market'", matched.len());

    Ok(())
}
