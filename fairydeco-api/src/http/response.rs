//! Success envelope shared by the book endpoints

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `{"success": true, "data": ...}` wrapper the web client expects
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
}

impl<T: Serialize> SuccessResponse<T> {
    pub const fn new(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

impl SuccessResponse<()> {
    /// Success with `"data": null`
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            success: true,
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for SuccessResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_serializes_null_data() {
        let json = serde_json::to_value(SuccessResponse::empty()).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": null}));
    }

    #[test]
    fn test_with_data() {
        let json = serde_json::to_value(SuccessResponse::new(3)).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": 3}));
    }
}
