use std::path::{Path, PathBuf};

use rusqlite::{params, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{Article, NewArticle, RelevanceScore};

use super::schema::SCHEMA;

const ARTICLE_COLUMNS: &str = "id, title, link, published, text, relevance";

/// Article store backed by a single SQLite file.
///
/// Holds only the database location; every operation opens its own
/// connection and drops it when done.
#[derive(Debug, Clone)]
pub struct Repository {
    db_path: PathBuf,
}

impl Repository {
    /// Creates the schema if absent. Safe to call repeatedly.
    pub async fn initialize(location: impl AsRef<Path>) -> Result<Self> {
        let db_path = location.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let repository = Self { db_path };
        repository
            .connect()
            .await?
            .call(|conn| {
                conn.execute_batch(SCHEMA)?;
                Ok(())
            })
            .await?;

        Ok(repository)
    }

    async fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.db_path).await?)
    }

    /// Returns `true` when a new row was created, `false` when the
    /// `(title, link)` pair was already stored.
    pub async fn insert(&self, entry: NewArticle) -> Result<bool> {
        let inserted = self
            .connect()
            .await?
            .call(move |conn| {
                let changed = conn.execute(
                    r#"INSERT OR IGNORE INTO news (title, link, published, text)
                       VALUES (?1, ?2, ?3, ?4)"#,
                    params![entry.title, entry.link, entry.published, entry.text],
                )?;
                Ok(changed == 1)
            })
            .await?;
        Ok(inserted)
    }

    pub async fn query_unscored(&self) -> Result<Vec<Article>> {
        self.query_articles(format!(
            "SELECT {ARTICLE_COLUMNS} FROM news WHERE relevance IS NULL ORDER BY id"
        ))
        .await
    }

    pub async fn query_all(&self) -> Result<Vec<Article>> {
        self.query_articles(format!("SELECT {ARTICLE_COLUMNS} FROM news ORDER BY id"))
            .await
    }

    async fn query_articles(&self, sql: String) -> Result<Vec<Article>> {
        let articles = self
            .connect()
            .await?
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let articles = stmt
                    .query_map([], article_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    /// Sets the score on every still-unscored row with this exact title,
    /// whatever its link. Returns the number of rows changed.
    pub async fn update_score(&self, title: &str, score: RelevanceScore) -> Result<usize> {
        let title = title.to_string();
        let updated = self
            .connect()
            .await?
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE news SET relevance = ?1 WHERE title = ?2 AND relevance IS NULL",
                    params![score, title],
                )?;
                Ok(changed)
            })
            .await?;
        Ok(updated)
    }
}

fn article_from_row(row: &Row) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        link: row.get(2)?,
        published: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        text: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        relevance: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_repo() -> (TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::initialize(dir.path().join("data").join("news.db"))
            .await
            .unwrap();
        (dir, repo)
    }

    fn entry(title: &str, link: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            link: link.to_string(),
            published: "Mon, 13 Oct 2025 08:00:00 +0000".to_string(),
            text: format!("Body of {title}"),
        }
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let (dir, repo) = test_repo().await;
        repo.insert(entry("A", "https://a.test")).await.unwrap();

        let reopened = Repository::initialize(dir.path().join("data").join("news.db"))
            .await
            .unwrap();
        assert_eq!(reopened.query_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_title_and_link_is_ignored() {
        let (_dir, repo) = test_repo().await;

        assert!(repo.insert(entry("Chip shortage", "https://a.test/1")).await.unwrap());
        assert!(!repo.insert(entry("Chip shortage", "https://a.test/1")).await.unwrap());

        let all = repo.query_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].relevance, None);
    }

    #[tokio::test]
    async fn same_title_with_different_link_is_a_new_row() {
        let (_dir, repo) = test_repo().await;

        assert!(repo.insert(entry("Chip shortage", "https://a.test/1")).await.unwrap());
        assert!(repo.insert(entry("Chip shortage", "https://b.test/1")).await.unwrap());
        assert_eq!(repo.query_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_store_has_no_unscored_rows() {
        let (_dir, repo) = test_repo().await;
        assert!(repo.query_unscored().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unscored_rows_come_back_in_insertion_order() {
        let (_dir, repo) = test_repo().await;
        for (title, link) in [("B", "https://b.test"), ("A", "https://a.test"), ("C", "https://c.test")] {
            repo.insert(entry(title, link)).await.unwrap();
        }
        repo.update_score("A", RelevanceScore::Low).await.unwrap();

        let titles: Vec<String> = repo
            .query_unscored()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["B", "C"]);
    }

    #[tokio::test]
    async fn update_score_matches_every_row_with_the_title() {
        let (_dir, repo) = test_repo().await;
        repo.insert(entry("Fab fire", "https://a.test")).await.unwrap();
        repo.insert(entry("Fab fire", "https://b.test")).await.unwrap();
        repo.insert(entry("Other", "https://c.test")).await.unwrap();

        let updated = repo.update_score("Fab fire", RelevanceScore::Critical).await.unwrap();
        assert_eq!(updated, 2);

        let all = repo.query_all().await.unwrap();
        assert_eq!(all[0].relevance, Some(RelevanceScore::Critical));
        assert_eq!(all[1].relevance, Some(RelevanceScore::Critical));
        assert_eq!(all[2].relevance, None);
    }

    #[tokio::test]
    async fn scored_rows_are_not_rescored() {
        let (_dir, repo) = test_repo().await;
        repo.insert(entry("Fab fire", "https://a.test")).await.unwrap();

        assert_eq!(repo.update_score("Fab fire", RelevanceScore::High).await.unwrap(), 1);
        assert_eq!(repo.update_score("Fab fire", RelevanceScore::Noise).await.unwrap(), 0);

        let all = repo.query_all().await.unwrap();
        assert_eq!(all[0].relevance, Some(RelevanceScore::High));
    }
}
