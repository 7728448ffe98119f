//! In-memory cache of the peers the bot can address.

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::RwLock;
use tracing::debug;

/// Which id space a peer id belongs to.
///
/// User ids and chat ids are allocated independently, so the same number
/// can name a user and a group at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatKind {
    /// A user or bot.
    User,

    /// A group, supergroup or channel.
    Chat,
}

/// Peers seen in updates or loaded from the session, by kind and bare id.
#[derive(Debug)]
pub struct PeerCache<R> {
    entries: RwLock<HashMap<(ChatKind, i64), R>>,
}

impl<R> Default for PeerCache<R> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<R: Copy> PeerCache<R> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remembers a peer.
    pub async fn insert(&self, kind: ChatKind, id: i64, peer: R) {
        self.entries.write().await.insert((kind, id), peer);
    }

    /// Returns a cached peer.
    pub async fn get(&self, kind: ChatKind, id: i64) -> Option<R> {
        self.entries.read().await.get(&(kind, id)).copied()
    }

    /// Returns a cached peer, or asks `lookup` and caches what it finds.
    pub async fn resolve<F, Fut>(&self, kind: ChatKind, id: i64, lookup: F) -> Option<R>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<R>>,
    {
        if let Some(peer) = self.get(kind, id).await {
            return Some(peer);
        }

        let peer = lookup().await?;
        debug!("Loaded {:?} {} from the session", kind, id);
        self.insert(kind, id, peer).await;
        Some(peer)
    }

    /// Number of cached peers.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::telegram::ChannelAddress;

    #[tokio::test]
    async fn test_kinds_do_not_collide() {
        let cache = PeerCache::new();
        cache.insert(ChatKind::User, 7, 'u').await;
        cache.insert(ChatKind::Chat, 7, 'c').await;

        assert_eq!(cache.get(ChatKind::User, 7).await, Some('u'));
        assert_eq!(cache.get(ChatKind::Chat, 7).await, Some('c'));
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_resolve_falls_back_once_then_caches() {
        let cache = PeerCache::new();
        let counter = AtomicUsize::new(0);
        let lookups = &counter;
        let lookup = move || async move {
            lookups.fetch_add(1, Ordering::SeqCst);
            Some(1_234_567_890_u64)
        };

        assert_eq!(cache.resolve(ChatKind::Chat, 1_234_567_890, lookup).await, Some(1_234_567_890));
        assert_eq!(cache.resolve(ChatKind::Chat, 1_234_567_890, lookup).await, Some(1_234_567_890));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_channel_id_resolves_from_session_fallback() {
        let Some(ChannelAddress::Id(id)) = ChannelAddress::parse("-1001234567890") else {
            panic!("expected a numeric channel address");
        };
        let cache = PeerCache::new();

        // Nothing seen in updates yet, the stored peer is used
        let resolved = cache
            .resolve(ChatKind::Chat, id, || async move { Some(id * 10) })
            .await;
        assert_eq!(resolved, Some(12_345_678_900));
        assert_eq!(cache.get(ChatKind::Chat, 1_234_567_890).await, Some(12_345_678_900));
        assert_eq!(cache.get(ChatKind::User, 1_234_567_890).await, None);
    }

    #[tokio::test]
    async fn test_resolve_miss_is_not_cached() {
        let cache: PeerCache<u64> = PeerCache::new();

        assert_eq!(cache.resolve(ChatKind::User, 5, || async { None }).await, None);
        assert!(cache.is_empty().await);

        // Seen in an update later on
        cache.insert(ChatKind::User, 5, 50).await;
        assert_eq!(cache.resolve(ChatKind::User, 5, || async { None }).await, Some(50));
    }
}
