//! Per-user conversation state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::reports::{ReportDraft, ReportKind, ReportReason};

/// Where a user is in the report conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    /// Waiting for the user to pick what to report.
    ChoosingKind,

    /// Waiting for the username or link of the target.
    AwaitingTarget { kind: ReportKind },

    /// Waiting for the user to pick a reason.
    ChoosingReason { kind: ReportKind, target: String },

    /// Waiting for additional details or `/skip`.
    AwaitingDetails {
        kind: ReportKind,
        target: String,
        reason: ReportReason,
    },

    /// Waiting for the user to confirm the summary.
    Confirming(ReportDraft),
}

impl ConversationState {
    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ChoosingKind => "choosing_kind",
            Self::AwaitingTarget { .. } => "awaiting_target",
            Self::ChoosingReason { .. } => "choosing_reason",
            Self::AwaitingDetails { .. } => "awaiting_details",
            Self::Confirming(_) => "confirming",
        }
    }
}

/// A user's conversation, locked for the duration of one update.
pub type ConversationSlot = OwnedMutexGuard<Option<ConversationState>>;

/// Active conversations keyed by user id.
///
/// Each user has their own slot. Holding a slot serializes the updates of
/// that user without blocking anybody else.
#[derive(Debug, Default)]
pub struct Conversations {
    slots: Mutex<HashMap<i64, Arc<Mutex<Option<ConversationState>>>>>,
}

impl Conversations {
    /// Creates an empty set of conversations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the user's slot until the returned guard is dropped.
    pub async fn lock(&self, user_id: i64) -> ConversationSlot {
        let slot = {
            let mut slots = self.slots.lock().await;
            Arc::clone(slots.entry(user_id).or_default())
        };
        slot.lock_owned().await
    }

    /// Returns the state of the user's conversation, if any.
    pub async fn get(&self, user_id: i64) -> Option<ConversationState> {
        self.lock(user_id).await.clone()
    }

    /// Moves the user's conversation to a new state.
    pub async fn set(&self, user_id: i64, state: ConversationState) {
        *self.lock(user_id).await = Some(state);
    }

    /// Ends the user's conversation, returning its last state.
    pub async fn end(&self, user_id: i64) -> Option<ConversationState> {
        self.lock(user_id).await.take()
    }

    /// Number of users in a conversation.
    pub async fn active(&self) -> usize {
        let slots: Vec<_> = self.slots.lock().await.values().cloned().collect();

        let mut active = 0;
        for slot in slots {
            if slot.lock().await.is_some() {
                active += 1;
            }
        }
        active
    }

    /// Drops idle slots of users without a conversation. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let mut slots = self.slots.lock().await;
        let before = slots.len();
        slots.retain(|_, slot| {
            Arc::strong_count(slot) > 1 || !matches!(slot.try_lock(), Ok(state) if state.is_none())
        });
        before - slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_end() {
        let conversations = Conversations::new();
        assert!(conversations.get(1).await.is_none());

        conversations.set(1, ConversationState::ChoosingKind).await;
        assert_eq!(conversations.get(1).await, Some(ConversationState::ChoosingKind));
        assert_eq!(conversations.active().await, 1);

        assert_eq!(conversations.end(1).await, Some(ConversationState::ChoosingKind));
        assert!(conversations.get(1).await.is_none());
        assert_eq!(conversations.end(1).await, None);
    }

    #[tokio::test]
    async fn test_slot_serializes_updates_of_one_user() {
        let conversations = Arc::new(Conversations::new());
        let mut slot = conversations.lock(1).await;

        let waiting = {
            let conversations = Arc::clone(&conversations);
            tokio::spawn(async move { conversations.get(1).await })
        };
        tokio::task::yield_now().await;
        assert!(!waiting.is_finished());

        // Other users are not blocked
        conversations.set(2, ConversationState::ChoosingKind).await;

        *slot = Some(ConversationState::ChoosingKind);
        drop(slot);
        assert_eq!(waiting.await.unwrap(), Some(ConversationState::ChoosingKind));
    }

    #[tokio::test]
    async fn test_prune_keeps_active_conversations() {
        let conversations = Conversations::new();
        conversations.set(1, ConversationState::ChoosingKind).await;
        conversations.end(2).await;
        conversations.end(3).await;

        assert_eq!(conversations.prune().await, 2);
        assert_eq!(conversations.active().await, 1);
        assert_eq!(conversations.get(1).await, Some(ConversationState::ChoosingKind));
    }

    #[test]
    fn test_state_names() {
        let state = ConversationState::AwaitingTarget {
            kind: ReportKind::User,
        };
        assert_eq!(state.name(), "awaiting_target");
    }
}
