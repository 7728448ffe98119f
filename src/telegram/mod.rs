//! Telegram transport module.
//!
//! Connects the bot account over `MTProto`, feeds updates into the
//! report conversation and delivers new reports to the moderators.

mod client;
pub mod dispatcher;
mod notifier;
mod peers;

pub use client::{TelegramBot, TelegramError, to_input_message};
pub use notifier::{ChannelAddress, DeliverySummary, Outbox, Recipient, ReportNotifier};
pub use peers::{ChatKind, PeerCache};
