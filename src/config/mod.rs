//! Configuration module for the report bot.
//!
//! Handles loading of Telegram API credentials and bot settings
//! from the environment.

mod settings;

pub use settings::{BotSettings, ConfigError, TelegramConfig, parse_admin_ids};

/// Default maximum length of the report details, in characters.
pub const DEFAULT_MAX_REPORT_LENGTH: usize = 1000;

/// Default number of seconds between reports from the same user.
pub const DEFAULT_REPORT_COOLDOWN_SECS: u64 = 60;
