mod scorer;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::NewsAnalysis;

pub use scorer::Scorer;

/// Produces one relevance judgment per call. Unparseable replies come back
/// as noise; only transport and API failures are errors.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    async fn score(&self, title: &str, content: &str) -> Result<NewsAnalysis>;

    fn model(&self) -> &str;
}
