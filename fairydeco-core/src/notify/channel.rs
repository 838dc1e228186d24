use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;

use super::events::{NotificationMessage, TerminateReason};
use crate::models::BookId;

/// Registry-unique id of one subscription, distinguishes repeated
/// subscriptions to the same book
pub type ChannelId = u64;

/// Lifecycle of a notification channel
///
/// `Open` moves to exactly one of the terminal states and never leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChannelState {
    Open = 0,
    Delivered = 1,
    Closed = 2,
}

impl ChannelState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Open,
            1 => Self::Delivered,
            _ => Self::Closed,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Delivered => f.write_str("delivered"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

impl From<TerminateReason> for ChannelState {
    fn from(reason: TerminateReason) -> Self {
        match reason {
            TerminateReason::Delivered => Self::Delivered,
            _ => Self::Closed,
        }
    }
}

/// Delivery failures, handled inside the broker and never surfaced to publishers
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("channel already {0}")]
    AlreadyTerminated(ChannelState),

    #[error("subscriber stream dropped before delivery")]
    ReceiverGone,
}

struct Slot {
    sender: Option<oneshot::Sender<NotificationMessage>>,
    reason: Option<TerminateReason>,
}

/// One pending completion notification for one book
///
/// The sender half of a oneshot lives in a mutex-guarded slot. Whoever takes
/// it first (a publisher or one of the close paths) performs the only
/// terminal transition; every later attempt finds the slot empty and is a
/// no-op.
pub struct NotificationChannel {
    id: ChannelId,
    book_id: BookId,
    state: AtomicU8,
    slot: Mutex<Slot>,
}

impl NotificationChannel {
    /// Create an open channel and the receiver its subscriber stream waits on
    #[must_use]
    pub fn open(
        id: ChannelId,
        book_id: BookId,
    ) -> (Arc<Self>, oneshot::Receiver<NotificationMessage>) {
        let (sender, receiver) = oneshot::channel();
        let channel = Arc::new(Self {
            id,
            book_id,
            state: AtomicU8::new(ChannelState::Open as u8),
            slot: Mutex::new(Slot {
                sender: Some(sender),
                reason: None,
            }),
        });
        (channel, receiver)
    }

    #[must_use]
    pub const fn id(&self) -> ChannelId {
        self.id
    }

    #[must_use]
    pub const fn book_id(&self) -> BookId {
        self.book_id
    }

    #[must_use]
    pub fn state(&self) -> ChannelState {
        ChannelState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ChannelState::Open
    }

    /// Reason recorded by the terminal transition, `None` while open
    #[must_use]
    pub fn terminate_reason(&self) -> Option<TerminateReason> {
        self.slot.lock().reason
    }

    /// Hand `message` to the subscriber stream
    ///
    /// Moves the channel to `Delivered` on success. If the subscriber stream
    /// is already gone the channel moves to `Closed` instead.
    pub fn deliver(&self, message: NotificationMessage) -> Result<(), DeliveryError> {
        let mut slot = self.slot.lock();
        let Some(sender) = slot.sender.take() else {
            return Err(DeliveryError::AlreadyTerminated(self.state()));
        };

        match sender.send(message) {
            Ok(()) => {
                self.finish(&mut slot, TerminateReason::Delivered);
                Ok(())
            }
            Err(_) => {
                self.finish(&mut slot, TerminateReason::DeliveryFailed);
                Err(DeliveryError::ReceiverGone)
            }
        }
    }

    /// Close the channel without delivering anything
    ///
    /// Dropping the sender wakes the subscriber stream, which then ends.
    /// Returns `true` only for the call that performed the transition.
    pub fn terminate(&self, reason: TerminateReason) -> bool {
        let mut slot = self.slot.lock();
        if slot.sender.take().is_none() {
            return false;
        }
        self.finish(&mut slot, reason);
        true
    }

    fn finish(&self, slot: &mut Slot, reason: TerminateReason) {
        slot.reason = Some(reason);
        self.state
            .store(ChannelState::from(reason) as u8, Ordering::Release);
    }
}

impl fmt::Debug for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationChannel")
            .field("id", &self.id)
            .field("book_id", &self.book_id)
            .field("state", &self.state())
            .finish()
    }
}
