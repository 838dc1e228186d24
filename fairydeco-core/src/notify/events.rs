use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::BookId;

/// SSE event name sent when a book finishes generating
pub const BOOK_COMPLETE_EVENT: &str = "book-complete";

/// A single notification handed to a subscriber
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    event_name: String,
    payload: String,
}

impl NotificationMessage {
    pub fn new(event_name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            payload: payload.into(),
        }
    }

    /// Completion notice for `book_id`, worded for the Korean client UI
    #[must_use]
    pub fn book_complete(book_id: BookId) -> Self {
        Self::new(
            BOOK_COMPLETE_EVENT,
            format!("동화책 {book_id}의 제작이 완료되었습니다."),
        )
    }

    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// Why a notification channel left the open state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminateReason {
    /// The message was handed to the subscriber stream
    Delivered,
    /// The subscriber stream was dropped (client went away)
    Disconnected,
    /// The configured idle timeout elapsed
    TimedOut,
    /// Publishing found the subscriber stream already gone
    DeliveryFailed,
    /// A newer subscription for the same book replaced this one
    Superseded,
    /// The server is shutting down
    Shutdown,
}

impl TerminateReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Disconnected => "disconnected",
            Self::TimedOut => "timed_out",
            Self::DeliveryFailed => "delivery_failed",
            Self::Superseded => "superseded",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for TerminateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
