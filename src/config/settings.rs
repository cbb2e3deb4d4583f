//! Configuration settings for Skriv.

use crate::error::{Result, SkrivError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the YouTube Data API key.
pub const YOUTUBE_API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub youtube: YoutubeSettings,
    pub extraction: AgentSettings,
    pub blog: AgentSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level used when no `-v` flag is given (trace, debug, info, warn, error).
    pub log_level: String,
    /// Timeout for OpenAI requests in seconds.
    pub openai_timeout_seconds: u64,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            openai_timeout_seconds: crate::openai::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// YouTube-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// YouTube Data API key. Falls back to the `YOUTUBE_API_KEY` environment variable.
    pub api_key: Option<String>,
    /// Base URL of the YouTube Data API.
    pub api_base: String,
    /// Base URL used to fetch watch pages (caption track discovery).
    pub watch_base: String,
    /// Preferred transcript language.
    pub language: String,
    /// Timeout for YouTube requests in seconds.
    pub timeout_seconds: u64,
    /// Maximum number of top-level comments to fetch (0 disables).
    pub max_comments: u32,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            watch_base: "https://www.youtube.com".to_string(),
            language: "en".to_string(),
            timeout_seconds: 30,
            max_comments: 10,
        }
    }
}

/// Settings for one LLM agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// LLM model to use.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// How many times a reply that fails schema validation is sent back for correction.
    pub max_retries: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_retries: 2,
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
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
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
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SkrivError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skriv")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Resolve the YouTube API key from config or environment.
    pub fn youtube_api_key(&self) -> Option<String> {
        self.youtube
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(YOUTUBE_API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }

    /// Set a value by dotted key (e.g. `blog.model`), returning the updated settings.
    ///
    /// The value is parsed as a TOML scalar when possible, otherwise stored as a string.
    pub fn with_value(&self, key: &str, value: &str) -> Result<Self> {
        let mut root = toml::Value::try_from(self).map_err(|e| SkrivError::Config(e.to_string()))?;

        let parts: Vec<&str> = key.split('.').collect();
        let (last, sections) = parts
            .split_last()
            .ok_or_else(|| SkrivError::Config("Empty configuration key".to_string()))?;

        let mut table = root
            .as_table_mut()
            .ok_or_else(|| SkrivError::Config("Settings are not a table".to_string()))?;
        for section in sections {
            table = table
                .get_mut(*section)
                .and_then(|v| v.as_table_mut())
                .ok_or_else(|| SkrivError::Config(format!("Unknown configuration section: {}", section)))?;
        }

        let current = table.get(*last);
        let parsed = match current {
            Some(toml::Value::String(_)) | None => toml::Value::String(value.to_string()),
            Some(_) => parse_scalar(value),
        };
        if current.is_none() && !is_optional_key(key) {
            return Err(SkrivError::Config(format!("Unknown configuration key: {}", key)));
        }
        table.insert((*last).to_string(), parsed);

        root.try_into().map_err(|e: toml::de::Error| {
            SkrivError::Config(format!("Invalid value for {}: {}", key, e.message()))
        })
    }
}

/// Keys whose value is `None` by default and therefore absent from the serialized table.
fn is_optional_key(key: &str) -> bool {
    matches!(key, "youtube.api_key" | "prompts.custom_dir")
}

fn parse_scalar(value: &str) -> toml::Value {
    if let Ok(b) = value.parse::<bool>() {
        toml::Value::Boolean(b)
    } else if let Ok(i) = value.parse::<i64>() {
        toml::Value::Integer(i)
    } else if let Ok(f) = value.parse::<f64>() {
        toml::Value::Float(f)
    } else {
        toml::Value::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.youtube.language, "en");
        assert_eq!(settings.extraction.model, "gpt-4o-mini");
        assert_eq!(settings.blog.max_retries, 2);
        assert!(settings.prompts.custom_dir.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [blog]
            model = "gpt-4o"
            "#,
        )
        .unwrap();
        assert_eq!(settings.blog.model, "gpt-4o");
        assert_eq!(settings.blog.max_retries, 2);
        assert_eq!(settings.extraction.model, "gpt-4o-mini");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.youtube.language = "no".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.youtube.language, "no");
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.blog.model, "gpt-4o-mini");
    }

    #[test]
    fn test_with_value() {
        let settings = Settings::default();

        let updated = settings.with_value("blog.model", "gpt-4o").unwrap();
        assert_eq!(updated.blog.model, "gpt-4o");

        let updated = updated.with_value("extraction.temperature", "0.7").unwrap();
        assert!((updated.extraction.temperature - 0.7).abs() < f32::EPSILON);

        let updated = updated.with_value("extraction.max_retries", "5").unwrap();
        assert_eq!(updated.extraction.max_retries, 5);

        let updated = updated.with_value("youtube.api_key", "abc").unwrap();
        assert_eq!(updated.youtube.api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_with_value_rejects_unknown_keys() {
        let settings = Settings::default();
        assert!(settings.with_value("nope.model", "x").is_err());
        assert!(settings.with_value("blog.nope", "x").is_err());
        assert!(settings.with_value("blog.max_retries", "many").is_err());
    }

    #[test]
    fn test_youtube_api_key_from_config() {
        let mut settings = Settings::default();
        settings.youtube.api_key = Some("from-config".to_string());
        assert_eq!(settings.youtube_api_key().as_deref(), Some("from-config"));
    }
}
