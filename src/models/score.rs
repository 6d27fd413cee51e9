use std::fmt;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Operational risk rating assigned to an article.
///
/// Variants are declared in ascending order so the derived `Ord` matches the
/// numeric scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum RelevanceScore {
    Noise,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0} is not a relevance score (expected one of 0, 20, 50, 80, 100)")]
pub struct InvalidScore(pub i64);

impl RelevanceScore {
    pub const ALL: [RelevanceScore; 5] = [
        RelevanceScore::Noise,
        RelevanceScore::Low,
        RelevanceScore::Medium,
        RelevanceScore::High,
        RelevanceScore::Critical,
    ];

    pub fn value(self) -> u8 {
        match self {
            RelevanceScore::Noise => 0,
            RelevanceScore::Low => 20,
            RelevanceScore::Medium => 50,
            RelevanceScore::High => 80,
            RelevanceScore::Critical => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RelevanceScore::Noise => "noise",
            RelevanceScore::Low => "low",
            RelevanceScore::Medium => "medium",
            RelevanceScore::High => "high",
            RelevanceScore::Critical => "critical",
        }
    }

    /// JSON schema fragment constraining a value to the scale.
    pub fn json_schema() -> serde_json::Value {
        let values: Vec<u8> = Self::ALL.iter().map(|s| s.value()).collect();
        json!({
            "type": "integer",
            "enum": values,
            "description": "The operational risk score."
        })
    }
}

impl TryFrom<i64> for RelevanceScore {
    type Error = InvalidScore;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|score| i64::from(score.value()) == raw)
            .ok_or(InvalidScore(raw))
    }
}

impl From<RelevanceScore> for i64 {
    fn from(score: RelevanceScore) -> Self {
        i64::from(score.value())
    }
}

impl fmt::Display for RelevanceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl ToSql for RelevanceScore {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(*self)))
    }
}

impl FromSql for RelevanceScore {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        RelevanceScore::try_from(raw).map_err(|_| FromSqlError::OutOfRange(raw))
    }
}

/// Structured judgment returned by the scoring service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsAnalysis {
    pub reasoning: String,
    pub entities: Vec<String>,
    pub score: RelevanceScore,
}

impl NewsAnalysis {
    /// Fallback used when the service reply cannot be understood.
    pub fn noise(reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            entities: Vec::new(),
            score: RelevanceScore::Noise,
        }
    }

    pub fn json_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "reasoning": {
                    "type": "string",
                    "description": "Concise analysis of why this news impacts the physical supply chain."
                },
                "entities": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "List of key companies, materials, or locations involved."
                },
                "score": RelevanceScore::json_schema()
            },
            "required": ["reasoning", "entities", "score"],
            "additionalProperties": false
        })
    }
}
