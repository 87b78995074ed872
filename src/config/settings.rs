//! Configuration settings for Trendlens.

use crate::platform::SearchOrder;
use crate::summarize::FoldPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub youtube: YoutubeSettings,
    pub insights: InsightSettings,
    pub retry: RetrySettings,
    pub stats: StatsSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// YouTube-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// YouTube Data API key. Falls back to `YOUTUBE_API_KEY`.
    pub api_key: Option<String>,
    /// Base URL of the Data API.
    pub api_base_url: String,
    /// Base URL of the timed-text (captions) endpoint.
    pub transcript_base_url: String,
    /// Number of videos fetched per query.
    pub max_results: u32,
    /// Maximum comments fetched per video.
    pub max_comments: u32,
    /// Result ordering for searches.
    pub order: SearchOrder,
    /// Preferred transcript language.
    pub transcript_language: String,
    /// Maximum concurrent transcript/comment fetches.
    pub max_concurrent: usize,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            transcript_base_url: "https://www.youtube.com/api/timedtext".to_string(),
            max_results: 10,
            max_comments: 50,
            order: SearchOrder::ViewCount,
            transcript_language: "en".to_string(),
            max_concurrent: 4,
        }
    }
}

impl YoutubeSettings {
    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("YOUTUBE_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// Settings for the insight (summarization) pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightSettings {
    /// Chat model used for every chunk request.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum characters per chunk sent to the model.
    pub chunk_budget: usize,
    /// Maximum in-flight completion requests.
    pub max_concurrent: usize,
    /// How per-chunk answers are folded into one.
    pub fold: FoldPolicy,
    /// Separator used by the concatenate fold.
    pub separator: String,
    /// Deadline for answering one question of the battery.
    pub timeout_seconds: u64,
    /// Deadline for a single completion request.
    pub request_timeout_seconds: u64,
    /// OpenAI-compatible API base. Defaults to the OpenAI endpoint.
    pub api_base_url: Option<String>,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            chunk_budget: 1850,
            max_concurrent: 4,
            fold: FoldPolicy::Longest,
            separator: "\n\n".to_string(),
            timeout_seconds: 600,
            request_timeout_seconds: 300,
            api_base_url: None,
        }
    }
}

impl InsightSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Retry policy for upstream calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt, doubled afterwards.
    pub base_delay_ms: u64,
    /// Upper bound for a single delay.
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

/// Statistics settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsSettings {
    /// Number of hashtags reported in the ranking.
    pub top_hashtags: usize,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self { top_hashtags: 10 }
    }
}

/// HTTP API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::TrendlensError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trendlens")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.insights.chunk_budget, 1850);
        assert_eq!(settings.insights.fold, FoldPolicy::Longest);
        assert_eq!(settings.youtube.order, SearchOrder::ViewCount);
        assert_eq!(settings.retry.max_attempts, 3);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[insights]\nmodel = \"gpt-4.1\"\nfold = \"concatenate\"\n\n[youtube]\norder = \"date\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.insights.model, "gpt-4.1");
        assert_eq!(settings.insights.fold, FoldPolicy::Concatenate);
        assert_eq!(settings.insights.chunk_budget, 1850);
        assert_eq!(settings.youtube.order, SearchOrder::Date);
        assert_eq!(settings.youtube.max_comments, 50);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.server.port = 8080;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.server.port, 8080);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = PathBuf::from("/nonexistent/trendlens/config.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.server.port, 3000);
    }
}
