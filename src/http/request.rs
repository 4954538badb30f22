//! Request metadata extraction.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) when the client sent none
//! - Rebuild the CGI-style server values from the request and the headers a
//!   fronting web server forwards
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Missing forwarded headers are empty values, never errors

use axum::http::{request::Parts, HeaderMap, HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::routing::ServerVars;

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Script path as seen by the fronting web server.
pub const X_SCRIPT_NAME: HeaderName = HeaderName::from_static("x-script-name");

/// Path-info suffix as seen by the fronting web server.
pub const X_PATH_INFO: HeaderName = HeaderName::from_static("x-path-info");

/// Request ID generator for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request ID header value, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> String {
    header_str(headers, &X_REQUEST_ID)
        .unwrap_or("unknown")
        .to_string()
}

/// Server values for path normalization.
pub fn server_vars(parts: &Parts) -> ServerVars {
    let request_uri = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| parts.uri.path());

    ServerVars::new(
        header_str(&parts.headers, &X_SCRIPT_NAME).unwrap_or_default(),
        request_uri,
        header_str(&parts.headers, &X_PATH_INFO).unwrap_or_default(),
    )
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    #[test]
    fn test_server_vars_without_forwarded_headers() {
        let parts = parts(Request::get("/index.php?route=/sql").body(()).unwrap());
        assert_eq!(
            server_vars(&parts),
            ServerVars::new("", "/index.php?route=/sql", "")
        );
    }

    #[test]
    fn test_server_vars_with_forwarded_headers() {
        let parts = parts(
            Request::get("/app/index.php/extra")
                .header(X_SCRIPT_NAME, "/app/index.php/extra")
                .header(X_PATH_INFO, "/extra")
                .body(())
                .unwrap(),
        );
        let vars = server_vars(&parts);
        assert_eq!(vars.script_self, "/app/index.php/extra");
        assert_eq!(vars.path_info, "/extra");
    }

    #[test]
    fn test_generated_request_ids_are_unique_uuids() {
        let request = Request::get("/").body(()).unwrap();
        let mut make = MakeRequestUuid;
        let a = make.make_request_id(&request).unwrap();
        let b = make.make_request_id(&request).unwrap();

        let a = a.header_value().to_str().unwrap().to_string();
        assert!(Uuid::parse_str(&a).is_ok());
        assert_ne!(a, b.header_value().to_str().unwrap());
    }

    #[test]
    fn test_request_id_defaults_to_unknown() {
        assert_eq!(request_id(&HeaderMap::new()), "unknown");
    }
}
