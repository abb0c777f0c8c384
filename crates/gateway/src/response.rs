//! Success envelope formatting.
//!
//! The orchestrator is the only place responses are produced: handler
//! results are wrapped here, and errors are mapped by
//! [`GatewayError::into_response`](crate::error::GatewayError). Handlers
//! never format responses themselves.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Wraps a handler result in the success envelope.
///
/// Produces `{ "data": <result> }` with the route's success status, or an
/// empty body for 204 No Content.
pub fn success(status: StatusCode, data: Value) -> Response {
    if status == StatusCode::NO_CONTENT {
        return status.into_response();
    }
    (status, Json(serde_json::json!({ "data": data }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope() {
        let response = success(StatusCode::OK, json!({ "id": "abc" }));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_created_status() {
        let response = success(StatusCode::CREATED, json!({ "id": "abc" }));
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_no_content_has_no_body() {
        let response = success(StatusCode::NO_CONTENT, Value::Null);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get("content-type").is_none());
    }
}
