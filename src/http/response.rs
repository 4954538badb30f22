//! Error responses produced by the front controller.
//!
//! # Design Decisions
//! - Plain-text bodies; the status line carries the meaning
//! - 405 responses always list the allowed methods in `Allow`

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// 404 for a route no definition matches.
pub fn not_found(route: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        format!("Error 404! The page {route} was not found."),
    )
        .into_response()
}

/// 405 listing the methods the route does accept.
pub fn method_not_allowed(allowed: &[String]) -> Response {
    let mut response = (
        StatusCode::METHOD_NOT_ALLOWED,
        "Error 405! Request method not allowed.",
    )
        .into_response();

    if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

/// 400 for a form body that could not be read.
pub fn bad_request(reason: &str) -> Response {
    (StatusCode::BAD_REQUEST, format!("Error 400! {reason}")).into_response()
}

/// 500 for failures that are not the client's fault.
pub fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Error 500! Internal server error.",
    )
        .into_response()
}
