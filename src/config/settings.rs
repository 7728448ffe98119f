//! Application settings and Telegram configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{DEFAULT_MAX_REPORT_LENGTH, DEFAULT_REPORT_COOLDOWN_SECS};

/// Telegram API configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by `@BotFather`.
    pub bot_token: String,

    /// Telegram API ID (obtain from <https://my.telegram.org>).
    pub api_id: i32,

    /// Telegram API hash (obtain from <https://my.telegram.org>).
    pub api_hash: String,

    /// Path to the session file.
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
}

fn default_session_path() -> PathBuf {
    PathBuf::from("report_bot.session")
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(bot_token: String, api_id: i32, api_hash: String) -> Self {
        Self {
            bot_token,
            api_id,
            api_hash,
            session_path: default_session_path(),
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `BOT_TOKEN`, `TG_API_ID` and `TG_API_HASH` to be set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token =
            std::env::var("BOT_TOKEN").map_err(|_| ConfigError::MissingEnvVar("BOT_TOKEN"))?;

        let api_id: i32 = std::env::var("TG_API_ID")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_ID"))?
            .trim()
            .parse()
            .ok()
            .filter(|id| *id > 0)
            .ok_or(ConfigError::InvalidApiId)?;

        let api_hash = std::env::var("TG_API_HASH")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_HASH"))?;

        let session_path = std::env::var("TG_SESSION_PATH")
            .map_or_else(|_| default_session_path(), PathBuf::from);

        Ok(Self {
            bot_token,
            api_id,
            api_hash,
            session_path,
        })
    }
}

// The token and hash are secrets; keep them out of logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_id", &self.api_id)
            .field("session_path", &self.session_path)
            .finish_non_exhaustive()
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Users allowed to review reports. They also receive every report.
    #[serde(default)]
    pub admin_ids: Vec<i64>,

    /// Channel that receives every report (`@name`, `t.me` link or numeric id).
    #[serde(default)]
    pub report_channel: Option<String>,

    /// Path to the reports JSON file.
    #[serde(default = "default_reports_path")]
    pub reports_path: PathBuf,

    /// Maximum length of the report details, in characters.
    #[serde(default = "default_max_report_length")]
    pub max_report_length: usize,

    /// Seconds a user has to wait between two submitted reports.
    #[serde(default = "default_report_cooldown")]
    pub report_cooldown_secs: u64,

    /// Log level for the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_reports_path() -> PathBuf {
    PathBuf::from("reports.json")
}

const fn default_max_report_length() -> usize {
    DEFAULT_MAX_REPORT_LENGTH
}

const fn default_report_cooldown() -> u64 {
    DEFAULT_REPORT_COOLDOWN_SECS
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            admin_ids: Vec::new(),
            report_channel: None,
            reports_path: default_reports_path(),
            max_report_length: default_max_report_length(),
            report_cooldown_secs: default_report_cooldown(),
            log_level: default_log_level(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    ///
    /// Only `ADMIN_IDS` can fail: a list that does not parse is rejected
    /// rather than silently locking every admin out.
    pub fn from_env() -> Result<Self, ConfigError> {
        let admin_ids = std::env::var("ADMIN_IDS")
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_else(|_| Ok(Vec::new()))?;

        Ok(Self {
            admin_ids,
            report_channel: std::env::var("REPORT_CHANNEL_ID")
                .ok()
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
            reports_path: std::env::var("REPORTS_PATH")
                .map_or_else(|_| default_reports_path(), PathBuf::from),
            max_report_length: std::env::var("MAX_REPORT_LENGTH")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .filter(|len| *len > 0)
                .unwrap_or_else(default_max_report_length),
            report_cooldown_secs: std::env::var("REPORT_COOLDOWN")
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_else(default_report_cooldown),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| default_log_level()),
        })
    }

    /// Returns the report cooldown as a duration.
    #[must_use]
    pub const fn report_cooldown(&self) -> Duration {
        Duration::from_secs(self.report_cooldown_secs)
    }

    /// Checks whether the given user is a configured admin.
    #[must_use]
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }
}

/// Parses a comma separated list of user ids, skipping empty items.
pub fn parse_admin_ids(raw: &str) -> Result<Vec<i64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse()
                .map_err(|_| ConfigError::InvalidAdminId(item.to_owned()))
        })
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid API ID format (must be a positive integer)")]
    InvalidApiId,

    #[error("Invalid admin id in ADMIN_IDS: '{0}'")]
    InvalidAdminId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = BotSettings::default();
        assert!(settings.admin_ids.is_empty());
        assert!(settings.report_channel.is_none());
        assert_eq!(settings.max_report_length, 1000);
        assert_eq!(settings.report_cooldown(), Duration::from_secs(60));
        assert_eq!(settings.reports_path, PathBuf::from("reports.json"));
    }

    #[test]
    fn test_telegram_config_new() {
        let config = TelegramConfig::new("123:abc".to_owned(), 12345, "abc123".to_owned());
        assert_eq!(config.api_id, 12345);
        assert_eq!(config.api_hash, "abc123");
        assert_eq!(config.session_path, PathBuf::from("report_bot.session"));
    }

    #[test]
    fn test_telegram_config_debug_hides_secrets() {
        let config = TelegramConfig::new("123:secret".to_owned(), 1, "hash".to_owned());
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("api_hash"));
    }

    #[test]
    fn test_parse_admin_ids() {
        assert_eq!(parse_admin_ids("1,2, 3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_admin_ids("").unwrap(), Vec::<i64>::new());
        assert_eq!(parse_admin_ids("42,,").unwrap(), vec![42]);
    }

    #[test]
    fn test_parse_admin_ids_invalid() {
        let err = parse_admin_ids("1,abc").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAdminId(ref id) if id == "abc"));
    }

    #[test]
    fn test_is_admin() {
        let settings = BotSettings {
            admin_ids: vec![10, 20],
            ..BotSettings::default()
        };
        assert!(settings.is_admin(10));
        assert!(!settings.is_admin(30));
    }
}
