//! Telegram client wrapper for the bot account.

use std::sync::Arc;
use std::time::Duration;

use grammers_client::types::Peer;
use grammers_client::{Client, InputMessage, InvocationError, SignInError, button, reply_markup, sender};
use grammers_session::Session;
use grammers_session::storages::SqliteSession;
use grammers_session::types::{PeerAuth, PeerId, PeerInfo, PeerRef};
use grammers_tl_types as tl;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::notifier::{ChannelAddress, Outbox, Recipient};
use super::peers::{ChatKind, PeerCache};
use crate::config::TelegramConfig;
use crate::conversation::{BotCommand, OutgoingMessage, Sender};

/// Longest flood wait honored before giving up on a message.
const MAX_FLOOD_WAIT_SECS: u32 = 300;

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Sign in failed: {0}")]
    SignInFailed(String),

    #[error("Flood wait required: {0} seconds")]
    FloodWait(u32),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("API invocation error: {0}")]
    Invocation(String),

    #[error("User {0} has not started the bot yet")]
    UnknownPeer(i64),

    #[error("Report channel not available: {0}")]
    ChannelUnavailable(String),
}

impl From<InvocationError> for TelegramError {
    fn from(err: InvocationError) -> Self {
        let err_str = err.to_string();

        if (err_str.contains("FLOOD_WAIT") || err_str.contains("flood"))
            && let Some(seconds) = extract_flood_wait_seconds(&err_str)
        {
            return Self::FloodWait(seconds);
        }

        Self::Invocation(err_str)
    }
}

/// Extracts flood wait seconds from an error message.
fn extract_flood_wait_seconds(err_msg: &str) -> Option<u32> {
    let lower = err_msg.to_lowercase();
    let patterns = ["flood_wait_", "flood wait "];

    for pattern in patterns {
        if let Some(idx) = lower.find(pattern) {
            let start = idx + pattern.len();
            let num_str: String = lower[start..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if let Ok(seconds) = num_str.parse() {
                return Some(seconds);
            }
        }
    }
    None
}

/// High-level wrapper around the bot's grammers client.
pub struct TelegramBot {
    /// The underlying grammers client.
    client: Client,

    /// Handle to the sender pool for disconnection.
    handle: sender::SenderPoolHandle,

    /// Session storage, which keeps the access hashes of every peer seen.
    session: Arc<SqliteSession>,

    /// Username of the bot, used to match `/command@botname`.
    username: Option<String>,

    /// Peers seen in updates or loaded from the session.
    peers: PeerCache<PeerRef>,

    /// Configured report channel.
    channel_address: RwLock<Option<ChannelAddress>>,

    /// Resolved report channel.
    channel: RwLock<Option<PeerRef>>,

    /// Background task running the sender pool.
    _pool_task: JoinHandle<()>,
}

impl TelegramBot {
    /// Signs in with the bot token unless the session is already authorized.
    pub async fn sign_in(
        client: Client,
        handle: sender::SenderPoolHandle,
        session: Arc<SqliteSession>,
        pool_task: JoinHandle<()>,
        config: &TelegramConfig,
    ) -> Result<Self, TelegramError> {
        let is_authorized = client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        if is_authorized {
            info!("Reusing authorized session");
        } else {
            info!("Signing in with bot token...");
            match client.bot_sign_in(&config.bot_token, &config.api_hash).await {
                Ok(_user) => info!("Signed in as bot"),
                Err(SignInError::Other(e)) => return Err(e.into()),
                Err(e) => return Err(TelegramError::SignInFailed(e.to_string())),
            }
        }

        let me = client.get_me().await?;
        let username = me.username().map(str::to_owned);
        info!("Connected as @{}", username.as_deref().unwrap_or("<no username>"));

        Ok(Self {
            client,
            handle,
            session,
            username,
            peers: PeerCache::new(),
            channel_address: RwLock::new(None),
            channel: RwLock::new(None),
            _pool_task: pool_task,
        })
    }

    /// Returns the bot's username, if it has one.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns a reference to the underlying client for advanced operations.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Publishes the command list shown in the Telegram command menu.
    pub async fn set_commands(&self) -> Result<(), TelegramError> {
        let commands = BotCommand::all_commands()
            .into_iter()
            .map(|(command, description)| {
                tl::types::BotCommand {
                    command: command.to_owned(),
                    description: description.to_owned(),
                }
                .into()
            })
            .collect();

        let request = tl::functions::bots::SetBotCommands {
            scope: tl::enums::BotCommandScope::Default,
            lang_code: String::new(),
            commands,
        };

        self.client.invoke(&request).await?;
        debug!("Bot command menu updated");
        Ok(())
    }

    /// Remembers the sender of an update so reports can be delivered to it
    /// later, and converts it into a conversation sender if it is a user.
    pub async fn remember_sender(&self, peer: Option<&Peer>) -> Option<Sender> {
        let peer = peer?;
        self.remember_peer(peer).await;

        let Peer::User(user) = peer else {
            return None;
        };

        Some(Sender {
            id: user.id().bare_id(),
            first_name: user.first_name().unwrap_or_default().to_owned(),
            full_name: user.full_name(),
        })
    }

    /// Remembers a chat the bot has seen, so it can be addressed by id.
    pub async fn remember_peer(&self, peer: &Peer) {
        let kind = match peer {
            Peer::User(_) => ChatKind::User,
            _ => ChatKind::Chat,
        };
        if let Some(peer_ref) = peer.to_ref().await {
            self.peers.insert(kind, peer.id().bare_id(), peer_ref).await;
        }
    }

    /// Sets the report channel and tries to resolve it right away.
    ///
    /// Returns false if the value cannot name a channel. A channel that
    /// cannot be resolved yet is retried on every delivery.
    pub async fn configure_channel(&self, raw: &str) -> bool {
        let Some(address) = ChannelAddress::parse(raw) else {
            warn!("REPORT_CHANNEL_ID is not a username, link or id: {}", raw);
            return false;
        };

        *self.channel_address.write().await = Some(address);

        match self.channel_peer().await {
            Ok(_) => info!("Report channel resolved: {}", raw),
            Err(e) => warn!("{}; retrying when the next report is delivered", e),
        }
        true
    }

    /// Returns the report channel, resolving it if that has not worked yet.
    async fn channel_peer(&self) -> Result<PeerRef, TelegramError> {
        if let Some(peer) = *self.channel.read().await {
            return Ok(peer);
        }

        let address = self
            .channel_address
            .read()
            .await
            .clone()
            .ok_or_else(|| TelegramError::ChannelUnavailable("not configured".to_owned()))?;

        let peer = match &address {
            ChannelAddress::Username(name) => {
                let peer = self
                    .client
                    .resolve_username(name)
                    .await?
                    .ok_or_else(|| TelegramError::ChannelUnavailable(format!("@{name}")))?;
                peer.to_ref()
                    .await
                    .ok_or_else(|| TelegramError::ChannelUnavailable(format!("@{name}")))?
            }
            ChannelAddress::Id(id) => self
                .peers
                .resolve(ChatKind::Chat, *id, || self.stored_chat(*id))
                .await
                .ok_or_else(|| TelegramError::ChannelUnavailable(id.to_string()))?,
        };

        *self.channel.write().await = Some(peer);
        Ok(peer)
    }

    /// Looks a user up in the session storage.
    async fn stored_user(&self, user_id: i64) -> Option<PeerRef> {
        self.stored_peer(PeerId::user(user_id)).await
    }

    /// Looks a channel, or failing that a small group, up in the session storage.
    async fn stored_chat(&self, chat_id: i64) -> Option<PeerRef> {
        match self.stored_peer(PeerId::channel(chat_id)).await {
            Some(peer) => Some(peer),
            None => self.stored_peer(PeerId::chat(chat_id)).await,
        }
    }

    async fn stored_peer(&self, id: PeerId) -> Option<PeerRef> {
        let auth = match self.session.peer(id).await? {
            PeerInfo::User { auth, .. } | PeerInfo::Channel { auth, .. } => auth?,
            PeerInfo::Chat { .. } => PeerAuth::default(),
        };
        Some(PeerRef { id, auth })
    }

    /// Sends a message, waiting out one flood wait if Telegram asks for it.
    pub async fn send_message(
        &self,
        peer: PeerRef,
        message: &OutgoingMessage,
    ) -> Result<(), TelegramError> {
        match self.try_send(peer, message).await {
            Err(TelegramError::FloodWait(seconds)) if seconds <= MAX_FLOOD_WAIT_SECS => {
                warn!("Flood wait triggered: {} seconds", seconds);
                tokio::time::sleep(Duration::from_secs(u64::from(seconds))).await;
                self.try_send(peer, message).await
            }
            result => result,
        }
    }

    /// Sends a message to a user who has talked to the bot before, in this
    /// run or an earlier one.
    pub async fn send_to_user(
        &self,
        user_id: i64,
        message: &OutgoingMessage,
    ) -> Result<(), TelegramError> {
        let peer = self
            .peers
            .resolve(ChatKind::User, user_id, || self.stored_user(user_id))
            .await
            .ok_or(TelegramError::UnknownPeer(user_id))?;
        self.send_message(peer, message).await
    }

    async fn try_send(&self, peer: PeerRef, message: &OutgoingMessage) -> Result<(), TelegramError> {
        self.client
            .send_message(peer, to_input_message(message))
            .await
            .map(|_| ())
            .map_err(TelegramError::from)
    }

    /// Disconnects from Telegram.
    pub fn disconnect(&self) {
        info!("Disconnecting from Telegram...");
        self.handle.quit();
    }
}

impl Outbox for TelegramBot {
    async fn send(&self, recipient: Recipient, message: OutgoingMessage) -> Result<(), TelegramError> {
        match recipient {
            Recipient::Channel => {
                let peer = self.channel_peer().await?;
                self.send_message(peer, &message).await
            }
            Recipient::Admin(id) => self.send_to_user(id, &message).await,
        }
    }
}

impl std::fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBot")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Builds a grammers message with Markdown text and inline buttons.
pub fn to_input_message(message: &OutgoingMessage) -> InputMessage {
    let input = InputMessage::new().markdown(&message.text);

    match &message.keyboard {
        Some(keyboard) => {
            let rows = keyboard
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| button::inline(b.label.clone(), b.data.clone().into_bytes()))
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>();
            input.reply_markup(&reply_markup::inline(rows))
        }
        None => input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_flood_wait() {
        assert_eq!(extract_flood_wait_seconds("FLOOD_WAIT_120"), Some(120));
        assert_eq!(extract_flood_wait_seconds("rpc error 420: FLOOD_WAIT_7 caused by"), Some(7));
        assert_eq!(extract_flood_wait_seconds("flood wait 60 seconds"), Some(60));
        assert_eq!(extract_flood_wait_seconds("some other error"), None);
    }
}
