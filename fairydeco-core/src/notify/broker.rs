use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::channel::{DeliveryError, NotificationChannel};
use super::events::{NotificationMessage, TerminateReason};
use super::registry::SubscriptionRegistry;
use super::stream::SubscriptionStream;
use crate::models::BookId;

/// Broker behaviour knobs
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Close subscriptions that received nothing for this long (`None` = never)
    pub idle_timeout: Option<Duration>,
    /// Close the previous stream when a book id is subscribed again
    pub close_superseded: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            idle_timeout: None,
            close_superseded: true,
        }
    }
}

/// What happened to a publish; informational only, publishing never fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The message was handed to the live subscriber
    Delivered,
    /// Nobody was waiting for this book
    NoSubscriber,
    /// A subscriber was registered but its stream was already gone
    DeliveryFailed,
}

/// Keyed one-shot completion broker
///
/// One instance is built at startup and shared by the subscribe and publish
/// endpoints. Cloning shares the same registry.
#[derive(Clone, Default)]
pub struct CompletionBroker {
    registry: SubscriptionRegistry,
    config: Arc<BrokerConfig>,
    next_channel_id: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

impl CompletionBroker {
    #[must_use]
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            registry: SubscriptionRegistry::new(),
            config: Arc::new(config),
            next_channel_id: Arc::new(AtomicU64::new(1)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Open a subscription for `book_id`, replacing any earlier one
    ///
    /// After [`close_all`](Self::close_all) the returned stream is already
    /// closed and ends without an item.
    pub fn subscribe(&self, book_id: BookId) -> SubscriptionStream {
        let channel_id = self.next_channel_id.fetch_add(1, Ordering::Relaxed);
        let (channel, receiver) = NotificationChannel::open(channel_id, book_id);

        if let Some(previous) = self.registry.register(book_id, Arc::clone(&channel)) {
            self.supersede(&previous);
        }

        // Checked after registering: either close_all drains this entry or we see the flag
        if self.closed.load(Ordering::SeqCst) {
            channel.terminate(TerminateReason::Shutdown);
            self.registry.remove_if_current(book_id, channel_id);
            debug!(
                book_id = %book_id,
                channel_id,
                "Subscription refused, broker is shutting down"
            );
        } else {
            info!(
                book_id = %book_id,
                channel_id,
                "Client subscribed to book completion"
            );
        }

        SubscriptionStream::new(
            channel,
            receiver,
            self.registry.clone(),
            self.config.idle_timeout,
        )
    }

    /// Deliver `message` to the current subscriber of `book_id`, if any
    ///
    /// Never blocks and never fails the caller. The registry entry is removed
    /// whatever the delivery outcome.
    pub fn publish(&self, book_id: BookId, message: NotificationMessage) -> PublishOutcome {
        let Some(channel) = self.registry.lookup(book_id) else {
            debug!(book_id = %book_id, "No subscriber for book completion");
            return PublishOutcome::NoSubscriber;
        };

        let outcome = match channel.deliver(message) {
            Ok(()) => {
                info!(
                    book_id = %book_id,
                    channel_id = channel.id(),
                    "Book completion delivered"
                );
                PublishOutcome::Delivered
            }
            Err(DeliveryError::AlreadyTerminated(state)) => {
                debug!(
                    book_id = %book_id,
                    channel_id = channel.id(),
                    state = %state,
                    "Subscription already finished, nothing to deliver"
                );
                PublishOutcome::NoSubscriber
            }
            Err(err @ DeliveryError::ReceiverGone) => {
                warn!(
                    book_id = %book_id,
                    channel_id = channel.id(),
                    error = %err,
                    "Failed to deliver book completion"
                );
                PublishOutcome::DeliveryFailed
            }
        };

        self.registry.remove_if_current(book_id, channel.id());
        outcome
    }

    /// Close every open subscription and refuse new ones; returns how many
    /// were still open
    pub fn close_all(&self) -> usize {
        self.closed.store(true, Ordering::SeqCst);

        let closed = self
            .registry
            .drain()
            .iter()
            .filter(|channel| channel.terminate(TerminateReason::Shutdown))
            .count();

        if closed > 0 {
            info!(closed, "Closed pending book subscriptions");
        }
        closed
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_subscribed(&self, book_id: BookId) -> bool {
        self.registry.contains(book_id)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    fn supersede(&self, previous: &NotificationChannel) {
        if self.config.close_superseded {
            if previous.terminate(TerminateReason::Superseded) {
                info!(
                    book_id = %previous.book_id(),
                    channel_id = previous.id(),
                    "Closed superseded subscription"
                );
            }
        } else {
            debug!(
                book_id = %previous.book_id(),
                channel_id = previous.id(),
                "Superseded subscription left open"
            );
        }
    }
}
