// FairyDeco API Library
//
// HTTP endpoints for book completion notifications

pub mod http;

pub use http::{create_router, AppState};
