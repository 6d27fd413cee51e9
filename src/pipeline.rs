//! The ingestion and scoring cycle.
//!
//! One cycle picks a random topic, ingests until enough new articles are
//! stored (retrying with a fresh topic when a query runs dry), then scores
//! every unscored row in the store. Outcomes are values, not errors: the
//! caller only ever logs them.

use std::collections::HashSet;
use std::time::Duration;

use rand::seq::IndexedRandom;
use tracing::{debug, error, info, warn};

use crate::ai::{RelevanceScorer, Scorer};
use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::feed::CandidateSource;
use crate::models::NewArticle;
use crate::services::ContentSource;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub topics: Vec<String>,
    pub target_articles: usize,
    pub max_attempts: u32,
    pub request_delay: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            topics: config.topics.clone(),
            target_articles: config.target_articles,
            max_attempts: config.max_attempts,
            request_delay: config.request_delay(),
        }
    }
}

/// Result of one ingestion attempt for a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The target number of new articles was stored.
    Completed { inserted: usize, candidates: usize },
    /// Candidates ran out first; worth retrying with another query.
    Insufficient { inserted: usize, candidates: usize },
}

impl IngestOutcome {
    pub fn inserted(&self) -> usize {
        match self {
            IngestOutcome::Completed { inserted, .. } | IngestOutcome::Insufficient { inserted, .. } => {
                *inserted
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoringSummary {
    /// Scoring calls made.
    pub scored: usize,
    /// Rows whose relevance was set.
    pub rows_updated: usize,
}

#[derive(Debug)]
pub enum CycleOutcome {
    Scored {
        query: String,
        attempts: u32,
        inserted: usize,
        scoring: ScoringSummary,
    },
    Exhausted {
        attempts: u32,
    },
    Failed(AppError),
}

pub struct Pipeline<F, C, S = Scorer> {
    repository: Repository,
    fetcher: F,
    extractor: C,
    scorer: Option<S>,
    settings: PipelineSettings,
}

impl<F, C, S> Pipeline<F, C, S>
where
    F: CandidateSource,
    C: ContentSource,
    S: RelevanceScorer,
{
    pub fn new(repository: Repository, fetcher: F, extractor: C, settings: PipelineSettings) -> Self {
        Self {
            repository,
            fetcher,
            extractor,
            scorer: None,
            settings,
        }
    }

    pub fn with_scorer(mut self, scorer: S) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn pick_query(&self) -> Option<&str> {
        self.settings
            .topics
            .choose(&mut rand::rng())
            .map(String::as_str)
    }

    /// Stores extractable candidates for `query` until the target number of
    /// new rows is reached. Duplicates neither count nor stop the scan.
    pub async fn ingest(&self, query: &str) -> Result<IngestOutcome> {
        let candidates = self.fetcher.fetch_candidates(query).await;
        let total = candidates.len();
        let target = self.settings.target_articles;
        info!(query, candidates = total, "Fetched candidates");

        let mut inserted = 0;
        for (index, candidate) in candidates.into_iter().enumerate() {
            if index > 0 && !self.settings.request_delay.is_zero() {
                tokio::time::sleep(self.settings.request_delay).await;
            }

            let Some(text) = self
                .extractor
                .extract(&candidate.link)
                .await
                .filter(|t| !t.trim().is_empty())
            else {
                debug!(link = %candidate.link, "No content extracted, skipping");
                continue;
            };

            let title = candidate.title.clone();
            if !self.repository.insert(NewArticle::from_candidate(candidate, text)).await? {
                debug!(title = %title, "Already stored, skipping");
                continue;
            }

            inserted += 1;
            info!(title = %title, inserted, target, "Stored article");

            if inserted == target {
                info!(query, candidates = total, inserted, "Ingestion complete");
                return Ok(IngestOutcome::Completed {
                    inserted,
                    candidates: total,
                });
            }
        }

        warn!(query, inserted, target, "Not enough new articles for query");
        Ok(IngestOutcome::Insufficient {
            inserted,
            candidates: total,
        })
    }

    /// Scores every unscored row in the store, including leftovers from
    /// earlier runs.
    pub async fn score_unscored(&self) -> Result<ScoringSummary> {
        let scorer = self.scorer.as_ref().ok_or(AppError::MissingApiKey)?;
        let articles = self.repository.query_unscored().await?;
        info!(count = articles.len(), model = scorer.model(), "Scoring unscored articles");

        let mut summary = ScoringSummary::default();
        let mut seen_titles = HashSet::new();
        for article in articles {
            // Updates are keyed by title, so a repeated title was already set.
            if !seen_titles.insert(article.title.clone()) {
                continue;
            }

            let analysis = scorer.score(&article.title, &article.text).await?;
            info!(
                title = %article.title,
                score = %analysis.score,
                entities = ?analysis.entities,
                reasoning = %analysis.reasoning,
                "Scored article"
            );

            let updated = self
                .repository
                .update_score(&article.title, analysis.score)
                .await?;
            summary.scored += 1;
            summary.rows_updated += updated;
        }

        Ok(summary)
    }

    /// Runs one full cycle. Never fails: errors become `CycleOutcome::Failed`.
    pub async fn run_cycle(&self) -> CycleOutcome {
        self.try_cycle().await.unwrap_or_else(CycleOutcome::Failed)
    }

    async fn try_cycle(&self) -> Result<CycleOutcome> {
        let max_attempts = self.settings.max_attempts;

        for attempt in 1..=max_attempts {
            let query = self
                .pick_query()
                .ok_or_else(|| AppError::Config("topic catalog is empty".into()))?
                .to_string();
            info!(attempt, max_attempts, query = %query, "Search query");

            match self.ingest(&query).await? {
                IngestOutcome::Completed { inserted, .. } => {
                    let scoring = self.score_unscored().await?;
                    return Ok(CycleOutcome::Scored {
                        query,
                        attempts: attempt,
                        inserted,
                        scoring,
                    });
                }
                IngestOutcome::Insufficient { .. } => {
                    if attempt < max_attempts {
                        info!("Retrying with a different query");
                    }
                }
            }
        }

        error!(attempts = max_attempts, "No query yielded enough new articles");
        Ok(CycleOutcome::Exhausted {
            attempts: max_attempts,
        })
    }
}
