use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, Result};

/// Rubric bundled with the binary, used when no rubric file is configured.
pub const DEFAULT_RUBRIC: &str = include_str!("../prompts/system_prompt.md");

pub const API_KEY_ENV: &str = "GROQ_API_KEY";

const DEFAULT_TOPICS: &[&str] = &[
    "semiconductor supply chain",
    "TSMC manufacturing delays",
    "Nvidia GPU shortage",
    "Silicon wafer prices",
    "ASML lithography export controls",
    "Micron Technology logistics",
    "Rare earth metal exports China",
    "Samsung Electronics foundry",
    "Intel fabrication plant news",
    "Automotive chip shortage updates",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_search_endpoint")]
    pub search_endpoint: String,

    #[serde(default = "default_topics")]
    pub topics: Vec<String>,

    /// Newly stored articles needed for an ingestion attempt to succeed.
    #[serde(default = "default_target_articles")]
    pub target_articles: usize,

    /// Ingestion attempts per cycle, each with a fresh query.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    pub api_key: Option<String>,

    pub system_prompt_path: Option<String>,

    #[serde(default = "default_min_score")]
    pub min_score: u8,

    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sentinel")
        .join("database.db")
        .to_string_lossy()
        .to_string()
}

fn default_search_endpoint() -> String {
    "https://www.bing.com/news/search".to_string()
}

fn default_topics() -> Vec<String> {
    DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect()
}

fn default_target_articles() -> usize {
    5
}

fn default_max_attempts() -> u32 {
    3
}

fn default_request_delay_ms() -> u64 {
    500
}

fn default_model() -> String {
    "openai/gpt-oss-120b".to_string()
}

fn default_api_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_min_score() -> u8 {
    50
}

fn default_preview_chars() -> usize {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            search_endpoint: default_search_endpoint(),
            topics: default_topics(),
            target_articles: default_target_articles(),
            max_attempts: default_max_attempts(),
            request_delay_ms: default_request_delay_ms(),
            model: default_model(),
            api_base_url: default_api_base_url(),
            api_key: None,
            system_prompt_path: None,
            min_score: default_min_score(),
            preview_chars: default_preview_chars(),
        }
    }
}

impl Config {
    /// Loads the config file, writing one with defaults if it does not exist.
    /// `GROQ_API_KEY` takes precedence over a key in the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml_str(&content)?
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            tracing::info!("Wrote default config to {}", config_path.display());
            config
        };

        let config = config.with_api_key_override(std::env::var(API_KEY_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sentinel")
            .join("config.toml")
    }

    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.topics.is_empty() || self.topics.iter().any(|t| t.trim().is_empty()) {
            return Err(AppError::Config("topics must be a non-empty list of queries".into()));
        }
        if self.target_articles == 0 {
            return Err(AppError::Config("target_articles must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(AppError::Config("max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// The scoring rubric: the configured file if it exists, else the
    /// bundled default.
    pub fn rubric(&self) -> Result<String> {
        match &self.system_prompt_path {
            Some(path) if Path::new(path).exists() => Ok(std::fs::read_to_string(path)?),
            Some(path) => {
                tracing::warn!("Rubric file {} not found; using bundled rubric", path);
                Ok(DEFAULT_RUBRIC.to_string())
            }
            None => Ok(DEFAULT_RUBRIC.to_string()),
        }
    }
}
