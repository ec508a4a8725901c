use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub telegram_bot_token: Option<String>,
    pub gnews_api_key: Option<String>,
    pub gemini_api_key: Option<String>,

    /// Channel that also receives every digest; only `-100…` ids are used.
    pub broadcast_channel_id: Option<String>,

    #[serde(default = "default_gnews_language")]
    pub gnews_language: String,

    #[serde(default = "default_gnews_country")]
    pub gnews_country: String,

    #[serde(default = "default_gnews_max_articles")]
    pub gnews_max_articles: u32,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Port for the plain-text status route.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("news-digest");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("memory.db").to_string_lossy().to_string()
}

fn default_gnews_language() -> String {
    "en".to_string()
}

fn default_gnews_country() -> String {
    "in".to_string()
}

fn default_gnews_max_articles() -> u32 {
    5
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_port() -> u16 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            telegram_bot_token: None,
            gnews_api_key: None,
            gemini_api_key: None,
            broadcast_channel_id: None,
            gnews_language: default_gnews_language(),
            gnews_country: default_gnews_country(),
            gnews_max_articles: default_gnews_max_articles(),
            gemini_model: default_gemini_model(),
            poll_timeout_secs: default_poll_timeout(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Reads the config file (writing defaults on first run), then lets the
    /// process environment and a `.env` file override secrets and paths.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Config::default();
            config.save()?;
            config
        };

        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Ignoring unreadable .env file: {}", e);
            }
        }
        config.apply_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.telegram_bot_token = Some(token);
        }
        if let Some(key) = lookup("GNEWS_API_KEY") {
            self.gnews_api_key = Some(key);
        }
        if let Some(key) = lookup("GOOGLE_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Some(channel) = lookup("TELEGRAM_CHAT_ID") {
            self.broadcast_channel_id = Some(channel);
        }
        if let Some(path) = lookup("NEWS_DIGEST_DB") {
            self.db_path = path;
        }
        if let Some(port) = lookup("PORT") {
            match port.trim().parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT {:?}", port),
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("news-digest")
            .join("config.toml")
    }

    pub fn require_bot_token(&self) -> Result<&str> {
        self.telegram_bot_token
            .as_deref()
            .ok_or_else(|| AppError::Config("TELEGRAM_BOT_TOKEN is missing".to_string()))
    }

    /// Broadcast target, if one is configured and looks like a channel id.
    pub fn broadcast_channel(&self) -> Option<&str> {
        self.broadcast_channel_id
            .as_deref()
            .filter(|id| id.starts_with("-100"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn partial_file_gets_defaults() {
        let config: Config = toml::from_str(
            r#"
            db_path = "/tmp/memory.db"
            gnews_api_key = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path, "/tmp/memory.db");
        assert_eq!(config.gnews_api_key.as_deref(), Some("abc"));
        assert_eq!(config.gnews_country, "in");
        assert_eq!(config.gnews_language, "en");
        assert_eq!(config.gnews_max_articles, 5);
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
        assert_eq!(config.poll_timeout_secs, 30);
        assert_eq!(config.port, 5000);
        assert!(config.telegram_bot_token.is_none());
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("GOOGLE_API_KEY", "gemini"),
            ("GNEWS_API_KEY", "  "),
            ("TELEGRAM_CHAT_ID", "-100200"),
        ]);
        let mut config = Config {
            gnews_api_key: Some("from-file".to_string()),
            ..Config::default()
        };

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(tokio_test::assert_ok!(config.require_bot_token()), "123:abc");
        assert_eq!(config.gemini_api_key.as_deref(), Some("gemini"));
        assert_eq!(config.gnews_api_key.as_deref(), Some("from-file"));
        assert_eq!(config.broadcast_channel(), Some("-100200"));
    }

    #[test]
    fn port_comes_from_environment() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "PORT").then(|| "8080".to_string()));
        assert_eq!(config.port, 8080);

        config.apply_overrides(|key| (key == "PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let config = Config::default();
        assert!(matches!(
            config.require_bot_token(),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn broadcast_requires_channel_prefix() {
        let config = Config {
            broadcast_channel_id: Some("12345".to_string()),
            ..Config::default()
        };
        assert_eq!(config.broadcast_channel(), None);
    }
}
