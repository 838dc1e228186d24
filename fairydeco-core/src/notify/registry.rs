use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use super::channel::{ChannelId, NotificationChannel};
use crate::models::BookId;

/// Map of book id -> the one live notification channel for it
///
/// Cloning is cheap and every clone sees the same entries.
#[derive(Clone, Default)]
pub struct SubscriptionRegistry {
    entries: Arc<DashMap<BookId, Arc<NotificationChannel>>>,
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the channel for `book_id`
    ///
    /// Returns the channel that was replaced, if any. The registry does not
    /// close it; that is up to the caller.
    pub fn register(
        &self,
        book_id: BookId,
        channel: Arc<NotificationChannel>,
    ) -> Option<Arc<NotificationChannel>> {
        self.entries.insert(book_id, channel)
    }

    /// Current channel for `book_id`
    #[must_use]
    pub fn lookup(&self, book_id: BookId) -> Option<Arc<NotificationChannel>> {
        self.entries
            .get(&book_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Remove whatever channel is registered for `book_id`; absent keys are a no-op
    pub fn remove(&self, book_id: BookId) -> Option<Arc<NotificationChannel>> {
        self.entries.remove(&book_id).map(|(_, channel)| channel)
    }

    /// Remove the entry only if it still belongs to `channel_id`
    ///
    /// A retiring stream must not evict a newer subscription that replaced it.
    pub fn remove_if_current(&self, book_id: BookId, channel_id: ChannelId) -> bool {
        let removed = self
            .entries
            .remove_if(&book_id, |_, channel| channel.id() == channel_id)
            .is_some();

        if removed {
            debug!(book_id = %book_id, channel_id, "Subscription removed from registry");
        }

        removed
    }

    /// Remove and return every registered channel
    pub fn drain(&self) -> Vec<Arc<NotificationChannel>> {
        let book_ids: Vec<BookId> = self.entries.iter().map(|entry| *entry.key()).collect();

        book_ids
            .into_iter()
            .filter_map(|book_id| self.remove(book_id))
            .collect()
    }

    #[must_use]
    pub fn contains(&self, book_id: BookId) -> bool {
        self.entries.contains_key(&book_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
