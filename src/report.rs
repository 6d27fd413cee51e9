//! Read-side view of the store: ordering, threshold filtering, headline
//! figures and the plain-text listing.

use textwrap::Options;

use crate::models::Article;

pub const CRITICAL_SCORE: u8 = 80;
pub const WARNING_SCORE: u8 = 50;

const LISTING_WIDTH: usize = 88;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn from_score(score: u8) -> Self {
        if score >= CRITICAL_SCORE {
            Severity::Critical
        } else if score >= WARNING_SCORE {
            Severity::Warning
        } else {
            Severity::Info
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Severity::Critical => "🚨",
            Severity::Warning => "⚠️",
            Severity::Info => "ℹ️",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    /// Articles at or above the threshold.
    pub active_threats: usize,
    pub critical_risks: usize,
    pub highest_score: Option<u8>,
}

/// Scored articles at or above `min_score`, highest first. Unscored rows
/// never pass the filter.
pub fn visible_articles(articles: &[Article], min_score: u8) -> Vec<&Article> {
    let mut visible: Vec<&Article> = articles
        .iter()
        .filter(|a| a.score_value().is_some_and(|s| s >= min_score))
        .collect();
    visible.sort_by(|a, b| b.relevance.cmp(&a.relevance));
    visible
}

pub fn stats(articles: &[Article], min_score: u8) -> DashboardStats {
    let scores = articles.iter().filter_map(Article::score_value);
    DashboardStats {
        active_threats: scores.clone().filter(|s| *s >= min_score).count(),
        critical_risks: scores.clone().filter(|s| *s >= CRITICAL_SCORE).count(),
        highest_score: scores.max(),
    }
}

pub fn render_listing(
    articles: &[Article],
    min_score: u8,
    preview_chars: usize,
    limit: Option<usize>,
) -> String {
    let stats = stats(articles, min_score);
    let highest = stats
        .highest_score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut out = format!(
        "Supply Chain Threat Monitor (minimum score {min_score})\n\
         Active threats: {} | Critical risks ({CRITICAL_SCORE}+): {} | Highest risk score: {highest}\n",
        stats.active_threats, stats.critical_risks
    );

    let visible = visible_articles(articles, min_score);
    if visible.is_empty() {
        out.push_str("\nNo articles at or above this score.\n");
        return out;
    }

    let body = Options::new(LISTING_WIDTH)
        .initial_indent("    ")
        .subsequent_indent("    ");

    for article in visible.into_iter().take(limit.unwrap_or(usize::MAX)) {
        let score = article.score_value().unwrap_or_default();
        out.push_str(&format!(
            "\n{} [{score}] {}\n",
            Severity::from_score(score).icon(),
            article.title
        ));
        if !article.published.is_empty() {
            out.push_str(&format!("    Date: {}\n", article.published));
        }
        out.push_str(&format!("    Link: {}\n", article.link));
        out.push_str(&textwrap::fill(&article.preview(preview_chars), &body));
        out.push('\n');
    }

    out
}
