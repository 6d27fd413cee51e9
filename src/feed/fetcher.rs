use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;

use crate::error::Result;
use crate::models::Candidate;

use super::CandidateSource;

pub struct FeedFetcher {
    client: Client,
    endpoint: String,
}

impl FeedFetcher {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("sentinel/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<Candidate>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch feed: HTTP {}", response.status()).into());
        }

        let bytes = response.bytes().await?;
        let feed = parser::parse(&bytes[..])?;

        Ok(feed.entries.into_iter().filter_map(candidate_from_entry).collect())
    }
}

#[async_trait]
impl CandidateSource for FeedFetcher {
    async fn fetch_candidates(&self, query: &str) -> Vec<Candidate> {
        let url = search_url(&self.endpoint, query);
        match self.fetch_feed(&url).await {
            Ok(candidates) => {
                tracing::debug!("Fetched {} candidates for {:?}", candidates.len(), query);
                candidates
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "Feed search failed");
                Vec::new()
            }
        }
    }
}

/// Builds `<endpoint>?q=<query>&format=rss`, with spaces encoded as `+`.
pub fn search_url(endpoint: &str, query: &str) -> String {
    let encoded = urlencoding::encode(query).replace("%20", "+");
    format!("{endpoint}?q={encoded}&format=rss")
}

fn candidate_from_entry(entry: Entry) -> Option<Candidate> {
    let link = entry.links.into_iter().next().map(|l| l.href)?;

    Some(Candidate {
        title: entry
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled".to_string()),
        link,
        published: format_published(entry.published.or(entry.updated)),
    })
}

fn format_published(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.to_rfc2822()).unwrap_or_default()
}
