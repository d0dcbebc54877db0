//! Application settings and Telegram configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::query::SearchSettings;

/// Telegram API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Telegram API ID (obtain from <https://my.telegram.org>).
    pub api_id: i32,

    /// Telegram API hash (obtain from <https://my.telegram.org>).
    pub api_hash: String,

    /// Bot token issued by @BotFather.
    pub bot_token: String,

    /// Path to the session file.
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
}

fn default_session_path() -> PathBuf {
    PathBuf::from("bot_session.db")
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(api_id: i32, api_hash: String, bot_token: String) -> Self {
        Self {
            api_id,
            api_hash,
            bot_token,
            session_path: default_session_path(),
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `TG_API_ID`, `TG_API_HASH` and `TG_BOT_TOKEN` to be set.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_id: i32 = std::env::var("TG_API_ID")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_ID"))?
            .parse()
            .map_err(|_| ConfigError::InvalidApiId)?;

        let api_hash = std::env::var("TG_API_HASH")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_HASH"))?;

        let bot_token = std::env::var("TG_BOT_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("TG_BOT_TOKEN"))?;
        if !looks_like_bot_token(&bot_token) {
            return Err(ConfigError::InvalidBotToken);
        }

        let session_path = std::env::var("TG_SESSION_PATH")
            .map_or_else(|_| default_session_path(), PathBuf::from);

        Ok(Self {
            api_id,
            api_hash,
            bot_token,
            session_path,
        })
    }
}

/// Checks the `<numeric id>:<secret>` shape of a bot token.
fn looks_like_bot_token(token: &str) -> bool {
    token.split_once(':').is_some_and(|(id, secret)| {
        !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) && !secret.is_empty()
    })
}

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Path to the catalogue JSON file.
    #[serde(default = "default_catalogue_path")]
    pub catalogue_path: PathBuf,

    /// Optional keyword table replacing the built-in one.
    #[serde(default)]
    pub keywords_path: Option<PathBuf>,

    /// Course search tunables.
    #[serde(default)]
    pub search: SearchSettings,

    /// Minimum interval between messages sent to one chat, in milliseconds.
    #[serde(default = "default_min_send_interval")]
    pub min_send_interval_ms: u64,
}

fn default_catalogue_path() -> PathBuf {
    PathBuf::from("program_data.json")
}

fn default_min_send_interval() -> u64 {
    1000 // Telegram allows about one message per second per chat
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            catalogue_path: default_catalogue_path(),
            keywords_path: None,
            search: SearchSettings::default(),
            min_send_interval_ms: default_min_send_interval(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        let defaults = SearchSettings::default();

        Self {
            catalogue_path: std::env::var("CATALOGUE_PATH")
                .map_or_else(|_| default_catalogue_path(), PathBuf::from),
            keywords_path: std::env::var("KEYWORDS_PATH").ok().map(PathBuf::from),
            search: SearchSettings {
                limit: env_parse("SEARCH_LIMIT").unwrap_or(defaults.limit),
                suggestion_count: env_parse("SUGGESTION_COUNT")
                    .unwrap_or(defaults.suggestion_count),
                suggestion_cutoff: env_parse("SUGGESTION_CUTOFF")
                    .filter(|c: &f64| (0.0..=1.0).contains(c))
                    .unwrap_or(defaults.suggestion_cutoff),
            },
            min_send_interval_ms: env_parse("MIN_SEND_INTERVAL_MS")
                .unwrap_or_else(default_min_send_interval),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid API ID format (must be a positive integer)")]
    InvalidApiId,

    #[error("Invalid bot token format (expected '<id>:<secret>' from @BotFather)")]
    InvalidBotToken,
}
