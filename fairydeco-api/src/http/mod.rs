// Module: http
// HTTP endpoints served to the web client and the generation pipeline

pub mod book;
pub mod error;
pub mod health;
pub mod response;

use axum::Router;
use fairydeco_core::{config::NotificationConfig, CompletionBroker};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::{AppError, AppResult};
pub use response::SuccessResponse;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub broker: CompletionBroker,
    pub notification_config: Arc<NotificationConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(broker: CompletionBroker, notification_config: NotificationConfig) -> Self {
        Self {
            broker,
            notification_config: Arc::new(notification_config),
        }
    }
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Health check endpoints (for monitoring probes)
        .merge(health::create_health_router())
        // Book completion subscribe/publish
        .merge(book::create_book_router())
        .fallback(route_not_found);

    // Apply layers before state
    let router = router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    router.with_state(state)
}

async fn route_not_found() -> AppError {
    AppError::not_found("Route not found")
}
