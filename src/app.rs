use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::models::{Article, RelevanceScore};
use crate::report::{self, DashboardStats};
use crate::tui::AppAction;

/// State behind the terminal dashboard. Read-only over the store.
pub struct App {
    // Data
    pub articles: Vec<Article>,

    // UI State
    pub min_score: u8,
    pub preview_chars: usize,
    pub selected_index: usize,
    pub show_help: bool,
    pub status: Option<String>,

    repository: Repository,
}

impl App {
    pub async fn new(config: &Config, min_score: Option<u8>) -> Result<Self> {
        let repository = Repository::initialize(&config.db_path).await?;
        let articles = repository.query_all().await?;

        Ok(Self {
            articles,
            min_score: min_score.unwrap_or(config.min_score),
            preview_chars: config.preview_chars,
            selected_index: 0,
            show_help: false,
            status: None,
            repository,
        })
    }

    pub fn visible_articles(&self) -> Vec<&Article> {
        report::visible_articles(&self.articles, self.min_score)
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.visible_articles().get(self.selected_index).copied()
    }

    pub fn stats(&self) -> DashboardStats {
        report::stats(&self.articles, self.min_score)
    }

    pub async fn handle_action(&mut self, action: AppAction) -> Result<bool> {
        match action {
            AppAction::Quit => return Ok(true),

            AppAction::MoveUp => {
                self.selected_index = self.selected_index.saturating_sub(1);
            }

            AppAction::MoveDown => {
                let len = self.visible_articles().len();
                if len > 0 && self.selected_index < len - 1 {
                    self.selected_index += 1;
                }
            }

            AppAction::MoveToTop => {
                self.selected_index = 0;
            }

            AppAction::MoveToBottom => {
                self.selected_index = self.visible_articles().len().saturating_sub(1);
            }

            AppAction::RaiseThreshold => {
                self.min_score = raise_threshold(self.min_score);
                self.clamp_selection();
            }

            AppAction::LowerThreshold => {
                self.min_score = lower_threshold(self.min_score);
                self.clamp_selection();
            }

            AppAction::Reload => {
                self.reload().await?;
            }

            AppAction::OpenInBrowser => {
                if let Some(article) = self.selected_article() {
                    let url = article.link.clone();
                    if let Err(e) = open::that(&url) {
                        tracing::warn!("Failed to open {}: {}", url, e);
                        self.status = Some(format!("Could not open {url}"));
                    }
                }
            }

            AppAction::ShowHelp => {
                self.show_help = true;
            }

            AppAction::HideHelp => {
                self.show_help = false;
            }
        }

        Ok(false)
    }

    pub async fn reload(&mut self) -> Result<()> {
        self.articles = self.repository.query_all().await?;
        self.clamp_selection();
        self.status = Some(format!("Loaded {} articles", self.articles.len()));
        Ok(())
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_articles().len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }
}

/// Next value on the score scale above `current`, capped at the top.
pub fn raise_threshold(current: u8) -> u8 {
    RelevanceScore::ALL
        .iter()
        .map(|s| s.value())
        .find(|v| *v > current)
        .unwrap_or(RelevanceScore::Critical.value())
}

/// Next value on the score scale below `current`, floored at zero.
pub fn lower_threshold(current: u8) -> u8 {
    RelevanceScore::ALL
        .iter()
        .rev()
        .map(|s| s.value())
        .find(|v| *v < current)
        .unwrap_or(RelevanceScore::Noise.value())
}
