//! Report types and definitions.

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// What kind of Telegram entity is being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    User,
    Group,
    Channel,
}

impl ReportKind {
    /// All kinds in the order they are offered to the user.
    pub const ALL: [Self; 3] = [Self::User, Self::Group, Self::Channel];

    /// Key used in callback data.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Channel => "channel",
        }
    }

    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "👤 User",
            Self::Group => "👥 Group",
            Self::Channel => "📢 Channel",
        }
    }

    /// Parses a callback key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Why the entity is being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportReason {
    Spam,
    Scam,
    Harassment,
    Illegal,
    Impersonation,
    Other,
}

impl ReportReason {
    /// All reasons in the order they are offered to the user.
    pub const ALL: [Self; 6] = [
        Self::Spam,
        Self::Scam,
        Self::Harassment,
        Self::Illegal,
        Self::Impersonation,
        Self::Other,
    ];

    /// Key used in callback data.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Spam => "spam",
            Self::Scam => "scam",
            Self::Harassment => "harassment",
            Self::Illegal => "illegal",
            Self::Impersonation => "impersonation",
            Self::Other => "other",
        }
    }

    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Spam => "📧 Spam",
            Self::Scam => "💰 Scam/Fraud",
            Self::Harassment => "⚠️ Harassment",
            Self::Illegal => "🚫 Illegal Content",
            Self::Impersonation => "👤 Impersonation",
            Self::Other => "📌 Other",
        }
    }

    /// Capitalized name shown in summaries and notifications.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Spam => "Spam",
            Self::Scam => "Scam",
            Self::Harassment => "Harassment",
            Self::Illegal => "Illegal",
            Self::Impersonation => "Impersonation",
            Self::Other => "Other",
        }
    }

    /// Parses a callback key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|reason| reason.key() == key)
    }
}

impl fmt::Display for ReportReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Review status of a stored report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Resolved,
    Rejected,
}

impl ReportStatus {
    /// Short label with an icon.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "⏳ Pending",
            Self::Resolved => "✅ Resolved",
            Self::Rejected => "❌ Rejected",
        }
    }

    /// Whether an admin has already acted on the report.
    #[must_use]
    pub const fn is_reviewed(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Resolved => f.write_str("resolved"),
            Self::Rejected => f.write_str("rejected"),
        }
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "resolved" => Ok(Self::Resolved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown report status: '{other}'")),
        }
    }
}

/// The user who filed a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reporter {
    /// Telegram user id.
    pub id: i64,

    /// First and last name as shown by Telegram.
    pub full_name: String,
}

/// A report collected by the conversation, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDraft {
    pub kind: ReportKind,
    pub target: String,
    pub reason: ReportReason,
    pub details: String,
}

/// A submitted report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Unique identifier, derived from the submission time.
    pub id: String,

    /// Submission time.
    pub created_at: DateTime<Local>,

    /// Who filed the report.
    pub reporter: Reporter,

    /// What kind of entity is reported.
    pub kind: ReportKind,

    /// Username or link of the reported entity.
    pub target: String,

    /// Reason chosen by the reporter.
    pub reason: ReportReason,

    /// Free-form details.
    pub details: String,

    /// Review status.
    #[serde(default)]
    pub status: ReportStatus,

    /// Admin who reviewed the report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_keys_round_trip() {
        for kind in ReportKind::ALL {
            assert_eq!(ReportKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(ReportKind::from_key("bot"), None);
    }

    #[test]
    fn test_reason_from_key() {
        assert_eq!(ReportReason::from_key("scam"), Some(ReportReason::Scam));
        assert_eq!(ReportReason::from_key("Scam"), None);
        assert_eq!(ReportReason::Scam.title(), "Scam");
        assert_eq!(ReportReason::Scam.label(), "💰 Scam/Fraud");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Resolved".parse::<ReportStatus>(), Ok(ReportStatus::Resolved));
        assert_eq!(" pending ".parse::<ReportStatus>(), Ok(ReportStatus::Pending));
        assert!("closed".parse::<ReportStatus>().is_err());
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&ReportStatus::Rejected).unwrap();
        assert_eq!(json, "\"rejected\"");
    }

    #[test]
    fn test_status_is_reviewed() {
        assert!(!ReportStatus::Pending.is_reviewed());
        assert!(ReportStatus::Resolved.is_reviewed());
        assert!(ReportStatus::Rejected.is_reviewed());
    }
}
