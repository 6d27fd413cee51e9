mod content_fetcher;

use async_trait::async_trait;

pub use content_fetcher::ContentFetcher;

/// Turns an article URL into its main readable text, or `None` when the page
/// could not be fetched or had no identifiable body.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn extract(&self, url: &str) -> Option<String>;
}
