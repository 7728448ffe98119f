//! Report conversation handler.
//!
//! The conversation follows a simple state machine:
//! 1. `/report` → pick a kind (user, group, channel)
//! 2. send the username or link of the target
//! 3. pick a reason
//! 4. send details, or `/skip`
//! 5. confirm → the report is stored, the cooldown starts and the
//!    report is broadcast to the channel and the admins
//!
//! `cancel` buttons and `/cancel` end the conversation at any step.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::state::{ConversationState, Conversations};
use super::types::{
    Action, BotCommand, Button, CallbackAction, Incoming, Keyboard, OutgoingMessage, Sender,
};
use crate::config::BotSettings;
use crate::cooldown::{Cooldowns, display_secs};
use crate::reports::{
    HISTORY_LIMIT, ReportDraft, ReportKind, ReportReason, ReportStatus, ReportStore, Reporter,
    StoreError, is_valid_target, render,
};

/// Details stored when the reporter uses `/skip`.
pub const NO_DETAILS: &str = "No additional details provided.";

const CANCELLED: &str = "❌ Report cancelled.";
const EXPIRED: &str = "This button has expired.";
const SAVE_FAILED: &str = "⚠️ Could not save your report. Please try again.";
const INVALID_TARGET: &str = "❌ Invalid format. Please provide a valid username or Telegram link.\n\n\
     Examples:\n\
     • @username\n\
     • https://t.me/username\n\
     • https://t.me/+abc123...";
const SUBMITTED: &str = "✅ **Report submitted successfully!**\n\n\
     Thank you for helping keep Telegram safe. Our team will review your report.\n\
     You can use /report to submit another report.";

/// Drives the report conversation of every user.
pub struct ReportFlow {
    /// Users allowed to review reports.
    admin_ids: Vec<i64>,

    /// Maximum length of the details text, in characters.
    max_details_length: usize,

    /// Active conversations.
    conversations: Conversations,

    /// Cooldowns between submitted reports.
    cooldowns: Cooldowns,

    /// Submitted reports.
    store: Arc<ReportStore>,
}

impl ReportFlow {
    /// Creates a new report flow.
    #[must_use]
    pub fn new(settings: &BotSettings, store: Arc<ReportStore>) -> Self {
        Self {
            admin_ids: settings.admin_ids.clone(),
            max_details_length: settings.max_report_length,
            conversations: Conversations::new(),
            cooldowns: Cooldowns::new(settings.report_cooldown()),
            store,
        }
    }

    /// Returns the report store.
    #[must_use]
    pub fn store(&self) -> &Arc<ReportStore> {
        &self.store
    }

    /// Returns the cooldown tracker.
    #[must_use]
    pub fn cooldowns(&self) -> &Cooldowns {
        &self.cooldowns
    }

    /// Returns the number of users currently filling in a report.
    pub async fn active_conversations(&self) -> usize {
        self.conversations.active().await
    }

    /// Handles one update from a user and returns what to send back.
    ///
    /// The user's conversation stays locked until the update is handled, so
    /// updates of one user are applied one at a time.
    pub async fn handle(&self, sender: &Sender, incoming: Incoming) -> Vec<Action> {
        debug!("Handling {:?} from user {}", incoming, sender.id);

        let mut slot = self.conversations.lock(sender.id).await;
        let state = &mut *slot;

        match incoming {
            Incoming::Command(command) => self.handle_command(sender, state, command).await,
            Incoming::Text(text) => self.handle_text(sender, state, text.trim()),
            Incoming::Callback(Some(action)) => self.handle_callback(sender, state, action).await,
            Incoming::Callback(None) => vec![Action::Toast(EXPIRED.to_owned())],
        }
    }

    /// Drops idle conversation slots. Returns how many were removed.
    pub async fn prune_conversations(&self) -> usize {
        self.conversations.prune().await
    }

    async fn handle_command(
        &self,
        sender: &Sender,
        state: &mut Option<ConversationState>,
        command: BotCommand,
    ) -> Vec<Action> {
        match command {
            BotCommand::Start => vec![reply(welcome_text(&sender.first_name))],
            BotCommand::Help => vec![reply(help_text())],
            BotCommand::Report => self.handle_report(sender, state).await,
            BotCommand::MyReports => self.handle_my_reports(sender).await,
            BotCommand::Cancel => handle_cancel(sender, state),
            BotCommand::Skip => handle_skip(state),
        }
    }

    async fn handle_report(
        &self,
        sender: &Sender,
        state: &mut Option<ConversationState>,
    ) -> Vec<Action> {
        if let Some(remaining) = self.cooldowns.remaining(sender.id).await {
            *state = None;
            debug!("User {} is on cooldown for {:?}", sender.id, remaining);
            return vec![reply(format!(
                "⏰ Please wait {} seconds before creating another report.",
                display_secs(remaining)
            ))];
        }

        if let Some(previous) = state.replace(ConversationState::ChoosingKind) {
            debug!(
                "User {} restarted the report from {}",
                sender.id,
                previous.name()
            );
        }

        vec![Action::Reply(
            OutgoingMessage::text(
                "🔍 **What would you like to report?**\n\n\
                 Please select one of the options below:",
            )
            .with_keyboard(kind_keyboard()),
        )]
    }

    async fn handle_my_reports(&self, sender: &Sender) -> Vec<Action> {
        let reports = self.store.recent_for(sender.id, HISTORY_LIMIT).await;
        vec![reply(render::history_text(&reports))]
    }

    fn handle_text(
        &self,
        sender: &Sender,
        state: &mut Option<ConversationState>,
        text: &str,
    ) -> Vec<Action> {
        if text.is_empty() {
            return Vec::new();
        }

        match state.take() {
            Some(ConversationState::AwaitingTarget { kind }) => {
                if !is_valid_target(text) {
                    *state = Some(ConversationState::AwaitingTarget { kind });
                    return vec![reply(INVALID_TARGET)];
                }

                *state = Some(ConversationState::ChoosingReason {
                    kind,
                    target: text.to_owned(),
                });

                vec![Action::Reply(
                    OutgoingMessage::text("⚠️ **Select a reason for your report:**")
                        .with_keyboard(reason_keyboard()),
                )]
            }
            Some(ConversationState::AwaitingDetails {
                kind,
                target,
                reason,
            }) => {
                if text.chars().count() > self.max_details_length {
                    *state = Some(ConversationState::AwaitingDetails {
                        kind,
                        target,
                        reason,
                    });
                    return vec![reply(format!(
                        "❌ Details too long. Maximum {} characters allowed.\n\
                         Please try again or use /skip to continue without details.",
                        self.max_details_length
                    ))];
                }

                debug!("User {} added details", sender.id);
                let draft = ReportDraft {
                    kind,
                    target,
                    reason,
                    details: text.to_owned(),
                };
                ask_confirmation(state, draft)
            }
            other => {
                // Buttons are expected, not text
                *state = other;
                Vec::new()
            }
        }
    }

    async fn handle_callback(
        &self,
        sender: &Sender,
        state: &mut Option<ConversationState>,
        action: CallbackAction,
    ) -> Vec<Action> {
        if let CallbackAction::Resolve(id) | CallbackAction::Reject(id) = &action {
            let Some(status) = action.review_status() else {
                return Vec::new();
            };
            return self.handle_review(sender, id, status).await;
        }

        let Some(current) = state.take() else {
            return vec![Action::Toast(EXPIRED.to_owned())];
        };

        match (current, action) {
            (
                ConversationState::ChoosingKind
                | ConversationState::ChoosingReason { .. }
                | ConversationState::Confirming(_),
                CallbackAction::Cancel,
            ) => {
                info!("User {} cancelled their report", sender.id);
                vec![edit(CANCELLED)]
            }
            (ConversationState::ChoosingKind, CallbackAction::Kind(kind)) => {
                *state = Some(ConversationState::AwaitingTarget { kind });
                vec![edit(target_prompt(kind))]
            }
            (ConversationState::ChoosingReason { kind, target }, CallbackAction::Reason(reason)) => {
                *state = Some(ConversationState::AwaitingDetails {
                    kind,
                    target,
                    reason,
                });
                vec![edit(format!(
                    "📝 **Please provide additional details:**\n\n\
                     Include any relevant information that might help us investigate this report.\n\
                     Maximum {} characters.\n\n\
                     Send /skip to continue without additional details.",
                    self.max_details_length
                ))]
            }
            (ConversationState::Confirming(draft), CallbackAction::Confirm) => {
                self.submit(sender, state, draft).await
            }
            (current, action) => {
                debug!(
                    "Ignoring {:?} from user {} in state {}",
                    action,
                    sender.id,
                    current.name()
                );
                *state = Some(current);
                vec![Action::Toast(EXPIRED.to_owned())]
            }
        }
    }

    async fn submit(
        &self,
        sender: &Sender,
        state: &mut Option<ConversationState>,
        draft: ReportDraft,
    ) -> Vec<Action> {
        let reporter = Reporter {
            id: sender.id,
            full_name: sender.full_name.clone(),
        };

        match self.store.submit(reporter, draft.clone()).await {
            Ok(report) => {
                self.cooldowns.start(sender.id).await;
                info!(
                    "Report #{} submitted by user {}: {} {} ({})",
                    report.id, sender.id, report.kind, report.target, report.reason
                );
                vec![edit(SUBMITTED), Action::Broadcast(report)]
            }
            Err(e) => {
                error!("Failed to store report from user {}: {}", sender.id, e);
                // Keep the draft so the user can press Confirm again
                *state = Some(ConversationState::Confirming(draft));
                vec![Action::Toast(SAVE_FAILED.to_owned())]
            }
        }
    }

    async fn handle_review(&self, sender: &Sender, id: &str, status: ReportStatus) -> Vec<Action> {
        if !self.admin_ids.contains(&sender.id) {
            warn!("User {} tried to review report #{}", sender.id, id);
            return vec![Action::Toast("Only admins can review reports.".to_owned())];
        }

        match self.store.review(id, status, sender.id).await {
            Ok(report) => vec![
                edit(render::reviewed_notification_text(&report)),
                Action::Toast(format!("Report #{} {}.", report.id, report.status)),
            ],
            Err(StoreError::AlreadyReviewed { status, .. }) => {
                vec![Action::Toast(format!("This report was already {status}."))]
            }
            Err(StoreError::NotFound(_)) => {
                warn!("Admin {} reviewed unknown report #{}", sender.id, id);
                vec![Action::Toast("Report not found.".to_owned())]
            }
            Err(e) => {
                error!("Failed to review report #{}: {}", id, e);
                vec![Action::Toast(
                    "⚠️ Could not update the report. Please try again.".to_owned(),
                )]
            }
        }
    }
}

impl std::fmt::Debug for ReportFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportFlow")
            .field("admin_ids", &self.admin_ids)
            .field("max_details_length", &self.max_details_length)
            .field("cooldowns", &self.cooldowns)
            .finish_non_exhaustive()
    }
}

fn reply(text: impl Into<String>) -> Action {
    Action::Reply(OutgoingMessage::text(text))
}

fn edit(text: impl Into<String>) -> Action {
    Action::Edit(OutgoingMessage::text(text))
}

fn handle_cancel(sender: &Sender, state: &mut Option<ConversationState>) -> Vec<Action> {
    if state.take().is_some() {
        info!("User {} cancelled their report", sender.id);
        vec![reply("❌ Operation cancelled. Use /report to start a new report.")]
    } else {
        vec![reply("There is nothing to cancel. Use /report to start a new report.")]
    }
}

fn handle_skip(state: &mut Option<ConversationState>) -> Vec<Action> {
    // `/skip` only applies to the details step
    let Some(ConversationState::AwaitingDetails {
        kind,
        target,
        reason,
    }) = state.take_if(|s| matches!(s, ConversationState::AwaitingDetails { .. }))
    else {
        return Vec::new();
    };

    let draft = ReportDraft {
        kind,
        target,
        reason,
        details: NO_DETAILS.to_owned(),
    };
    ask_confirmation(state, draft)
}

fn ask_confirmation(state: &mut Option<ConversationState>, draft: ReportDraft) -> Vec<Action> {
    let summary = render::confirmation_summary(&draft);
    *state = Some(ConversationState::Confirming(draft));

    vec![Action::Reply(
        OutgoingMessage::text(summary).with_keyboard(confirm_keyboard()),
    )]
}

fn welcome_text(first_name: &str) -> String {
    format!(
        "👋 Hello {first_name}!\n\n\
         Welcome to the Telegram Report Bot. This bot helps you report:\n\
         • Suspicious users\n\
         • Problematic groups\n\
         • Violating channels\n\n\
         Please use /report to start a new report.\n\
         Use /help to see all available commands."
    )
}

fn help_text() -> String {
    let mut lines = vec!["📚 **Available Commands:**".to_owned(), String::new()];

    for (name, description) in BotCommand::all_commands() {
        lines.push(format!("/{name} - {description}"));
    }

    lines.push(String::new());
    lines.push("**How to Report:**".to_owned());
    lines.extend(
        [
            "1. Use /report command",
            "2. Select what you want to report",
            "3. Provide the username or link",
            "4. Choose a reason",
            "5. Add additional details",
            "6. Confirm your report",
        ]
        .map(str::to_owned),
    );
    lines.push(String::new());
    lines.push("All reports are reviewed by our team.".to_owned());

    lines.join("\n")
}

fn target_prompt(kind: ReportKind) -> String {
    format!(
        "📝 You selected: **{}**\n\n\
         Please send the username or invite link of the {} you want to report.\n\n\
         Examples:\n\
         • Username: @username\n\
         • Link: https://t.me/username\n\
         • Group link: https://t.me/+abc123...",
        kind.label(),
        kind.key()
    )
}

fn cancel_button() -> Button {
    Button::new("❌ Cancel", &CallbackAction::Cancel)
}

fn kind_keyboard() -> Keyboard {
    ReportKind::ALL
        .into_iter()
        .fold(Keyboard::default(), |keyboard, kind| {
            keyboard.row(vec![Button::new(kind.label(), &CallbackAction::Kind(kind))])
        })
        .row(vec![cancel_button()])
}

fn reason_keyboard() -> Keyboard {
    ReportReason::ALL
        .into_iter()
        .fold(Keyboard::default(), |keyboard, reason| {
            keyboard.row(vec![Button::new(
                reason.label(),
                &CallbackAction::Reason(reason),
            )])
        })
        .row(vec![cancel_button()])
}

fn confirm_keyboard() -> Keyboard {
    Keyboard::default().row(vec![
        Button::new("✅ Confirm", &CallbackAction::Confirm),
        cancel_button(),
    ])
}

/// Resolve/Reject buttons attached to admin notifications.
#[must_use]
pub fn review_keyboard(report_id: &str) -> Keyboard {
    Keyboard::default().row(vec![
        Button::new("✅ Resolve", &CallbackAction::Resolve(report_id.to_owned())),
        Button::new("❌ Reject", &CallbackAction::Reject(report_id.to_owned())),
    ])
}
