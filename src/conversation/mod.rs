//! Report conversation module.
//!
//! Turns commands, text messages and button presses of each user into
//! replies, following the `/report` dialog. Nothing here talks to
//! Telegram directly; the transport executes the returned [`Action`]s.

mod handler;
mod state;
mod types;

pub use handler::{NO_DETAILS, ReportFlow, review_keyboard};
pub use state::{ConversationState, Conversations};
pub use types::{
    Action, BotCommand, Button, CallbackAction, Incoming, Keyboard, OutgoingMessage, Sender,
};
