mod article;
mod score;

pub use article::{Article, Candidate, NewArticle};
pub use score::{NewsAnalysis, RelevanceScore};
