//! Configuration module for the catalogue bot.
//!
//! Handles Telegram credentials, runtime settings, and the keyword table
//! that drives course recommendations.

mod keywords;
mod settings;

pub use keywords::{KeywordRule, KeywordTableError, RecommendationTable};
pub use settings::{BotSettings, ConfigError, TelegramConfig};
