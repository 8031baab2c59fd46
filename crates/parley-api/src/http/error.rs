//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
///
/// The assistant itself never fails a request (remote and storage failures
/// become reply text), so only malformed input reaches here.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or incomplete request body.
    Validation(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
        };
        (status, ApiResponse::error(code, &message, 0)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = AppError::Validation("user_id is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
