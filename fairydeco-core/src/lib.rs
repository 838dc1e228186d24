pub mod bootstrap;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod notify;

pub use config::Config;
pub use error::{Error, Result};
pub use models::BookId;
pub use notify::{CompletionBroker, NotificationMessage, PublishOutcome};
