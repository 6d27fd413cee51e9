use serde::{Deserialize, Serialize};

use super::RelevanceScore;

/// Feed entry that has not yet been checked for extractable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub link: String,
    pub published: String,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub link: String,
    pub published: String,
    pub text: String,
}

impl NewArticle {
    pub fn from_candidate(candidate: Candidate, text: String) -> Self {
        Self {
            title: candidate.title,
            link: candidate.link,
            published: candidate.published,
            text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub link: String,
    pub published: String,
    pub text: String,
    pub relevance: Option<RelevanceScore>,
}

impl Article {
    pub fn score_value(&self) -> Option<u8> {
        self.relevance.map(RelevanceScore::value)
    }

    /// Leading `max_chars` characters of the body, with an ellipsis when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        if self.text.trim().is_empty() {
            return "No text content.".to_string();
        }
        let mut chars = self.text.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}
