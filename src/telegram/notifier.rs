//! Delivery of new reports to the report channel and the admins.

use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use super::TelegramError;
use crate::conversation::{OutgoingMessage, review_keyboard};
use crate::reports::{Report, render};

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// The configured report channel.
    Channel,

    /// An admin, by user id.
    Admin(i64),
}

/// Anything that can deliver a message to a recipient.
pub trait Outbox: Send + Sync {
    /// Sends the message.
    fn send(
        &self,
        recipient: Recipient,
        message: OutgoingMessage,
    ) -> impl Future<Output = Result<(), TelegramError>> + Send;
}

/// How the report channel is addressed in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelAddress {
    /// Public username, without the `@`.
    Username(String),

    /// Numeric id; Bot API style `-100…` ids are reduced to the bare id.
    Id(i64),
}

impl ChannelAddress {
    /// Parses `@name`, `https://t.me/name`, `name` or a numeric id.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(id) = raw.parse::<i64>() {
            let bare = raw
                .strip_prefix("-100")
                .and_then(|rest| rest.parse::<i64>().ok())
                .unwrap_or_else(|| id.abs());
            return Some(Self::Id(bare));
        }

        let name = raw
            .strip_prefix("https://t.me/")
            .or_else(|| raw.strip_prefix("http://t.me/"))
            .or_else(|| raw.strip_prefix("t.me/"))
            .unwrap_or(raw);
        let name = name.trim_start_matches('@').trim_end_matches('/');

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }
        Some(Self::Username(name.to_owned()))
    }
}

/// Outcome of delivering one report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliverySummary {
    /// Recipients that received the report.
    pub delivered: Vec<Recipient>,

    /// Recipients the report could not be delivered to.
    pub failed: Vec<Recipient>,
}

/// Sends new reports to the report channel and every admin.
pub struct ReportNotifier<O> {
    outbox: Arc<O>,
    has_channel: bool,
    admin_ids: Vec<i64>,
}

impl<O: Outbox> ReportNotifier<O> {
    /// Creates a notifier.
    #[must_use]
    pub fn new(outbox: Arc<O>, has_channel: bool, admin_ids: Vec<i64>) -> Self {
        Self {
            outbox,
            has_channel,
            admin_ids,
        }
    }

    /// Delivers the report. A failure for one recipient does not stop the others.
    pub async fn deliver(&self, report: &Report) -> DeliverySummary {
        let text = render::notification_text(report);
        let mut summary = DeliverySummary::default();

        if self.has_channel {
            let result = self
                .outbox
                .send(Recipient::Channel, OutgoingMessage::text(text.clone()))
                .await;
            record(&mut summary, Recipient::Channel, result);
        }

        for &admin_id in &self.admin_ids {
            let message =
                OutgoingMessage::text(text.clone()).with_keyboard(review_keyboard(&report.id));
            let result = self.outbox.send(Recipient::Admin(admin_id), message).await;
            record(&mut summary, Recipient::Admin(admin_id), result);
        }

        info!(
            "Report #{} delivered to {} recipients ({} failed)",
            report.id,
            summary.delivered.len(),
            summary.failed.len()
        );
        summary
    }
}

fn record(summary: &mut DeliverySummary, recipient: Recipient, result: Result<(), TelegramError>) {
    match result {
        Ok(()) => summary.delivered.push(recipient),
        Err(e) => {
            match recipient {
                Recipient::Channel => warn!("Failed to send report to channel: {}", e),
                Recipient::Admin(id) => warn!("Failed to send report to admin {}: {}", id, e),
            }
            summary.failed.push(recipient);
        }
    }
}

impl<O> std::fmt::Debug for ReportNotifier<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportNotifier")
            .field("has_channel", &self.has_channel)
            .field("admin_ids", &self.admin_ids)
            .finish_non_exhaustive()
    }
}
