//! Book completion endpoints
//!
//! `GET /book/sse/{book_id}` keeps an event stream open until the book is
//! done; `GET /book/end/{book_id}` is called by the generation pipeline when
//! it is. The publish side always answers with success: a missing listener
//! or a dropped stream is expected and only logged.

use axum::{
    extract::{Path, State},
    http::header,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::get,
    Router,
};
use futures::StreamExt;
use std::convert::Infallible;
use tracing::{debug, info};

use crate::http::{AppResult, AppState, SuccessResponse};
use fairydeco_core::{BookId, NotificationMessage};

/// Content type sent on the event stream (the browser client expects the charset)
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream; charset=UTF-8";

/// Create the book router
pub fn create_book_router() -> Router<AppState> {
    Router::new()
        .route("/book/sse/{book_id}", get(subscribe_book_completion))
        .route("/book/end/{book_id}", get(book_complete))
}

/// GET /book/sse/{book_id} - Wait for a book to finish generating
pub async fn subscribe_book_completion(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let book_id: BookId = book_id.parse()?;

    let events = state.broker.subscribe(book_id).map(|message| {
        Ok::<_, Infallible>(
            Event::default()
                .event(message.event_name())
                .data(message.payload()),
        )
    });

    let keep_alive = KeepAlive::new().interval(state.notification_config.keep_alive_interval());

    Ok((
        [(header::CONTENT_TYPE, EVENT_STREAM_CONTENT_TYPE)],
        Sse::new(events).keep_alive(keep_alive),
    ))
}

/// GET /book/end/{book_id} - Generation pipeline reports a finished book
pub async fn book_complete(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> AppResult<SuccessResponse<()>> {
    let book_id: BookId = book_id.parse()?;
    info!(book_id = %book_id, "Book generation completed");

    let outcome = state
        .broker
        .publish(book_id, NotificationMessage::book_complete(book_id));
    debug!(book_id = %book_id, ?outcome, "Book completion published");

    Ok(SuccessResponse::empty())
}
