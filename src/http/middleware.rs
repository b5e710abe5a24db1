//! Error envelope for responses produced outside the handlers.

use axum::{
    body::Body,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::response::ApiError;

/// Rewrite bare error responses from the router and tower layers (405,
/// 408, 413, ...) into `{"status":"error","message":[...]}`.
///
/// Responses that already carry a JSON body pass through untouched.
pub async fn envelope_errors(request: Request<Body>, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }

    let (mut parts, _) = response.into_parts();
    let message = status.canonical_reason().unwrap_or("Request failed");
    tracing::debug!(status = status.as_u16(), "Wrapping bare error response");

    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);

    let mut enveloped = ApiError::new(status, message).into_response();
    enveloped.headers_mut().extend(parts.headers);
    enveloped
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}
