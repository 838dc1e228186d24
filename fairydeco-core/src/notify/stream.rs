use futures::stream::{FusedStream, Stream};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{Instant, Sleep};
use tracing::info;

use super::channel::{ChannelId, NotificationChannel};
use super::events::{NotificationMessage, TerminateReason};
use super::registry::SubscriptionRegistry;
use crate::models::BookId;

/// Subscriber side of one book subscription
///
/// Yields at most one [`NotificationMessage`] and then ends. It also ends,
/// without an item, when the channel is closed elsewhere (superseded,
/// shutdown) or when the idle timeout elapses. Dropping the stream while the
/// channel is still open counts as a client disconnect. Every exit path
/// clears this subscription's registry entry.
pub struct SubscriptionStream {
    channel: Arc<NotificationChannel>,
    receiver: oneshot::Receiver<NotificationMessage>,
    registry: SubscriptionRegistry,
    idle_deadline: Option<Instant>,
    idle_timer: Option<Pin<Box<Sleep>>>,
    finished: bool,
}

impl SubscriptionStream {
    pub(crate) fn new(
        channel: Arc<NotificationChannel>,
        receiver: oneshot::Receiver<NotificationMessage>,
        registry: SubscriptionRegistry,
        idle_timeout: Option<Duration>,
    ) -> Self {
        Self {
            channel,
            receiver,
            registry,
            idle_deadline: idle_timeout.map(|timeout| Instant::now() + timeout),
            idle_timer: None,
            finished: false,
        }
    }

    #[must_use]
    pub fn book_id(&self) -> BookId {
        self.channel.book_id()
    }

    #[must_use]
    pub fn channel_id(&self) -> ChannelId {
        self.channel.id()
    }

    #[must_use]
    pub fn channel(&self) -> &Arc<NotificationChannel> {
        &self.channel
    }

    fn retire(&self, reason: TerminateReason) -> bool {
        let transitioned = self.channel.terminate(reason);
        if transitioned {
            info!(
                book_id = %self.channel.book_id(),
                channel_id = self.channel.id(),
                reason = %reason,
                "Subscription closed"
            );
        }
        self.registry
            .remove_if_current(self.channel.book_id(), self.channel.id());
        transitioned
    }

    fn idle_elapsed(&mut self, cx: &mut Context<'_>) -> bool {
        let Some(deadline) = self.idle_deadline else {
            return false;
        };
        let timer = self
            .idle_timer
            .get_or_insert_with(|| Box::pin(tokio::time::sleep_until(deadline)));
        timer.as_mut().poll(cx).is_ready()
    }
}

impl Stream for SubscriptionStream {
    type Item = NotificationMessage;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(message)) => {
                this.finished = true;
                return Poll::Ready(Some(message));
            }
            Poll::Ready(Err(_)) => {
                // Sender dropped: closed by supersession or shutdown
                this.finished = true;
                this.retire(TerminateReason::Disconnected);
                return Poll::Ready(None);
            }
            Poll::Pending => {}
        }

        if this.idle_elapsed(cx) {
            this.finished = true;
            if !this.retire(TerminateReason::TimedOut) {
                // A publisher won the race; the message is already in the receiver
                if let Poll::Ready(Ok(message)) = Pin::new(&mut this.receiver).poll(cx) {
                    return Poll::Ready(Some(message));
                }
            }
            return Poll::Ready(None);
        }

        Poll::Pending
    }
}

impl FusedStream for SubscriptionStream {
    fn is_terminated(&self) -> bool {
        self.finished
    }
}

impl Drop for SubscriptionStream {
    fn drop(&mut self) {
        self.retire(TerminateReason::Disconnected);
    }
}

impl std::fmt::Debug for SubscriptionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionStream")
            .field("channel", &self.channel)
            .field("finished", &self.finished)
            .finish()
    }
}
