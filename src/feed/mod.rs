mod fetcher;

use async_trait::async_trait;

use crate::models::Candidate;

pub use fetcher::FeedFetcher;

/// Turns a search query into an ordered list of candidate articles.
///
/// Failures are absorbed: an unreachable or unparseable feed is simply an
/// empty result.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn fetch_candidates(&self, query: &str) -> Vec<Candidate>;
}
