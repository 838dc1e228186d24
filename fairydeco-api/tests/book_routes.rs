//! HTTP-level tests for the book completion endpoints
//!
//! Run with: cargo test -p fairydeco-api --test book_routes

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use fairydeco_api::{create_router, AppState};
use fairydeco_core::{config::NotificationConfig, BookId, CompletionBroker};
use http_body_util::BodyExt;
use tower::ServiceExt;

fn test_app() -> (Router, CompletionBroker) {
    test_app_with(NotificationConfig::default())
}

fn test_app_with(notification: NotificationConfig) -> (Router, CompletionBroker) {
    let broker = CompletionBroker::new(notification.broker_config());
    let router = create_router(AppState::new(broker.clone(), notification));
    (router, broker)
}

async fn body_text(body: Body) -> String {
    let collected = tokio::time::timeout(Duration::from_secs(5), body.collect())
        .await
        .expect("event stream ended")
        .unwrap()
        .to_bytes();
    String::from_utf8(collected.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_subscribe_then_complete_streams_single_event() {
    let (app, broker) = test_app();

    let sse = app.clone().oneshot(get("/book/sse/42")).await.unwrap();
    assert_eq!(sse.status(), StatusCode::OK);
    assert_eq!(
        sse.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream; charset=UTF-8"
    );
    assert!(broker.is_subscribed(BookId::new(42)));

    let end = app.clone().oneshot(get("/book/end/42")).await.unwrap();
    assert_eq!(end.status(), StatusCode::OK);
    assert_eq!(
        body_json(end.into_body()).await,
        serde_json::json!({"success": true, "data": null})
    );

    // The event stream ends on its own after the one event
    let text = body_text(sse.into_body()).await;

    assert!(text.contains("event: book-complete\n"), "got: {text}");
    assert!(
        text.contains("data: 동화책 42의 제작이 완료되었습니다.\n"),
        "got: {text}"
    );
    assert_eq!(text.matches("event: ").count(), 1);
    assert!(!broker.is_subscribed(BookId::new(42)));
}

#[tokio::test]
async fn test_complete_without_subscriber_still_succeeds() {
    let (app, _broker) = test_app();

    let end = app.oneshot(get("/book/end/7")).await.unwrap();
    assert_eq!(end.status(), StatusCode::OK);
    assert_eq!(
        body_json(end.into_body()).await,
        serde_json::json!({"success": true, "data": null})
    );
}

#[tokio::test]
async fn test_client_disconnect_clears_subscription() {
    let (app, broker) = test_app();

    let sse = app.clone().oneshot(get("/book/sse/8")).await.unwrap();
    assert!(broker.is_subscribed(BookId::new(8)));

    // Dropping the response body is what the server sees when the client goes away
    drop(sse);
    assert!(!broker.is_subscribed(BookId::new(8)));

    let end = app.oneshot(get("/book/end/8")).await.unwrap();
    assert_eq!(end.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_reports_pending_subscriptions() {
    let (app, _broker) = test_app();

    let _first = app.clone().oneshot(get("/book/sse/1")).await.unwrap();
    let _second = app.clone().oneshot(get("/book/sse/2")).await.unwrap();

    let ready = app.clone().oneshot(get("/health/ready")).await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
    assert_eq!(
        body_json(ready.into_body()).await,
        serde_json::json!({"status": "ok", "subscriptions": 2})
    );

    let health = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_book_id_is_rejected() {
    let (app, broker) = test_app();

    let response = app.clone().oneshot(get("/book/sse/not-a-number")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response.into_body()).await,
        serde_json::json!({"error": "Invalid book id: not-a-number", "status": 400})
    );
    assert_eq!(broker.subscriber_count(), 0);

    let response = app.oneshot(get("/book/end/99999999999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_idle_stream_sends_keep_alive_comments() {
    let (app, broker) = test_app_with(NotificationConfig {
        keep_alive_seconds: 5,
        ..NotificationConfig::default()
    });

    let sse = app.oneshot(get("/book/sse/3")).await.unwrap();
    let mut body = sse.into_body();

    // Paused clock auto-advances to the keep-alive tick
    let frame = tokio::time::timeout(Duration::from_secs(6), body.frame())
        .await
        .expect("keep-alive sent before the interval elapsed twice")
        .expect("stream still open")
        .unwrap();
    let bytes = frame.into_data().unwrap();
    assert!(bytes.starts_with(b":"), "got: {bytes:?}");

    // A comment frame is not a delivery
    assert!(broker.is_subscribed(BookId::new(3)));
}

#[tokio::test]
async fn test_second_subscribe_ends_first_stream_without_event() {
    let (app, broker) = test_app();

    let first = app.clone().oneshot(get("/book/sse/5")).await.unwrap();
    let second = app.clone().oneshot(get("/book/sse/5")).await.unwrap();
    assert_eq!(broker.subscriber_count(), 1);

    let first_text = body_text(first.into_body()).await;
    assert!(!first_text.contains("event:"), "got: {first_text}");
    assert!(broker.is_subscribed(BookId::new(5)));

    let end = app.oneshot(get("/book/end/5")).await.unwrap();
    assert_eq!(end.status(), StatusCode::OK);

    let second_text = body_text(second.into_body()).await;
    assert!(
        second_text.contains("data: 동화책 5의 제작이 완료되었습니다.\n"),
        "got: {second_text}"
    );
}

#[tokio::test]
async fn test_subscribe_during_shutdown_ends_at_once() {
    let (app, broker) = test_app();
    broker.close_all();

    let sse = app.oneshot(get("/book/sse/6")).await.unwrap();
    assert_eq!(sse.status(), StatusCode::OK);
    let text = body_text(sse.into_body()).await;
    assert!(!text.contains("event:"), "got: {text}");
    assert_eq!(broker.subscriber_count(), 0);
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let (app, _broker) = test_app();

    let response = app.oneshot(get("/book/unknown")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response.into_body()).await,
        serde_json::json!({"error": "Route not found", "status": 404})
    );
}
