//! Command, callback and action types.

use std::fmt;

use crate::reports::{Report, ReportKind, ReportReason, ReportStatus};

/// Commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// Show the welcome message.
    Start,

    /// Show help information.
    Help,

    /// Start a new report.
    Report,

    /// List the user's recent reports.
    MyReports,

    /// Cancel the current report.
    Cancel,

    /// Continue without additional details.
    Skip,
}

impl BotCommand {
    /// Parses a command from a message text.
    ///
    /// Accepts an optional `@botname` suffix; when `bot_username` is known,
    /// commands addressed to another bot are ignored. Returns `None` if the
    /// message is not a known command.
    #[must_use]
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let text = text.trim();
        let word = text.split_whitespace().next()?;
        let word = word.strip_prefix('/')?;

        let cmd = match word.split_once('@') {
            Some((cmd, addressee)) => {
                if let Some(own) = bot_username
                    && !addressee.eq_ignore_ascii_case(own)
                {
                    return None;
                }
                cmd
            }
            None => word,
        };

        match cmd.to_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "report" => Some(Self::Report),
            "myreports" => Some(Self::MyReports),
            "cancel" => Some(Self::Cancel),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }

    /// Returns the command name without the slash.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Report => "report",
            Self::MyReports => "myreports",
            Self::Cancel => "cancel",
            Self::Skip => "skip",
        }
    }

    /// Returns all commands with their descriptions, for help and the
    /// bot command menu.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str)> {
        vec![
            ("start", "Start the bot"),
            ("help", "Show this help message"),
            ("report", "Report a user, group, or channel"),
            ("myreports", "View your recent reports"),
            ("cancel", "Cancel current operation"),
        ]
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

/// Actions encoded in inline button data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// The reporter picked what to report.
    Kind(ReportKind),

    /// The reporter picked a reason.
    Reason(ReportReason),

    /// The reporter confirmed the summary.
    Confirm,

    /// The reporter cancelled.
    Cancel,

    /// An admin marked a report as resolved.
    Resolve(String),

    /// An admin rejected a report.
    Reject(String),
}

impl CallbackAction {
    /// Parses button data. Returns `None` for unknown data.
    #[must_use]
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "confirm" => return Some(Self::Confirm),
            "cancel" => return Some(Self::Cancel),
            _ => {}
        }

        let (prefix, value) = data.split_once('_')?;
        if value.is_empty() {
            return None;
        }

        match prefix {
            "type" => ReportKind::from_key(value).map(Self::Kind),
            "reason" => ReportReason::from_key(value).map(Self::Reason),
            "resolve" => Some(Self::Resolve(value.to_owned())),
            "reject" => Some(Self::Reject(value.to_owned())),
            _ => None,
        }
    }

    /// Encodes the action as button data.
    #[must_use]
    pub fn data(&self) -> String {
        match self {
            Self::Kind(kind) => format!("type_{}", kind.key()),
            Self::Reason(reason) => format!("reason_{}", reason.key()),
            Self::Confirm => "confirm".to_owned(),
            Self::Cancel => "cancel".to_owned(),
            Self::Resolve(id) => format!("resolve_{id}"),
            Self::Reject(id) => format!("reject_{id}"),
        }
    }

    /// The review status an admin action leads to.
    #[must_use]
    pub const fn review_status(&self) -> Option<ReportStatus> {
        match self {
            Self::Resolve(_) => Some(ReportStatus::Resolved),
            Self::Reject(_) => Some(ReportStatus::Rejected),
            _ => None,
        }
    }
}

/// A single inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    /// Creates a button for a callback action.
    #[must_use]
    pub fn new(label: impl Into<String>, action: &CallbackAction) -> Self {
        Self {
            label: label.into(),
            data: action.data(),
        }
    }
}

/// Rows of inline buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    /// Adds a row.
    #[must_use]
    pub fn row(mut self, buttons: Vec<Button>) -> Self {
        self.rows.push(buttons);
        self
    }

    /// Iterates over all buttons.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows.iter().flatten()
    }
}

/// A Markdown message with an optional inline keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl OutgoingMessage {
    /// Creates a plain text message.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    /// Attaches an inline keyboard.
    #[must_use]
    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// The user an update came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: i64,
    pub first_name: String,
    pub full_name: String,
}

/// An update, reduced to what the conversation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A known command.
    Command(BotCommand),

    /// Plain text that is not a command.
    Text(String),

    /// A button press; `None` if the data was not recognized.
    Callback(Option<CallbackAction>),
}

impl Incoming {
    /// Classifies a text message. Unknown commands and messages without
    /// text (photos, stickers, media without a caption) yield `None`.
    #[must_use]
    pub fn from_text(text: &str, bot_username: Option<&str>) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }
        if let Some(command) = BotCommand::parse(text, bot_username) {
            return Some(Self::Command(command));
        }
        if text.trim_start().starts_with('/') {
            return None;
        }
        Some(Self::Text(text.to_owned()))
    }

    /// Classifies button data.
    #[must_use]
    pub fn from_callback(data: &[u8]) -> Self {
        Self::Callback(std::str::from_utf8(data).ok().and_then(CallbackAction::parse))
    }
}

/// What the transport should do in response to an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send a new message to the chat the update came from.
    Reply(OutgoingMessage),

    /// Edit the message whose button was pressed.
    Edit(OutgoingMessage),

    /// Show a short notice as the answer to a button press.
    Toast(String),

    /// Deliver a new report to the report channel and the admins.
    Broadcast(Report),
}
