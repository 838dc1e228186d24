//! Book completion notifications
//!
//! A client opens a long-lived stream for one book id and waits for the
//! generation pipeline to report that the book is finished. Each
//! subscription is a one-shot [`NotificationChannel`] kept in the
//! [`SubscriptionRegistry`]; the [`CompletionBroker`] ties the two together.
//!
//! Delivery is best effort and at most once. A publish with no live
//! subscriber is dropped, a publish racing ahead of its subscribe is lost,
//! and a failed hand-off is logged and swallowed. Story data stays
//! retrievable through the regular book endpoints, so nothing here retries.

pub mod broker;
pub mod channel;
pub mod events;
pub mod registry;
pub mod stream;

pub use broker::{BrokerConfig, CompletionBroker, PublishOutcome};
pub use channel::{ChannelId, ChannelState, DeliveryError, NotificationChannel};
pub use events::{NotificationMessage, TerminateReason, BOOK_COMPLETE_EVENT};
pub use registry::SubscriptionRegistry;
pub use stream::SubscriptionStream;
