//! Structured error responses.
//!
//! # Responsibilities
//! - Map dispatch outcomes to well-formed JSON error bodies
//! - Keep the gateway's failure surface uniform: every request gets a
//!   response, never a dropped connection
//!
//! # Design Decisions
//! - Bodies are small fixed JSON shapes (`not_found`, `bad_gateway`, ...)
//! - 503 exists in this surface but is not wired into the dispatch path

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use serde_json::json;

pub const JSON_UTF8: &str = "application/json; charset=utf-8";

fn json_response(status: StatusCode, payload: serde_json::Value) -> Response<Body> {
    let body = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
    response
}

/// No backend is registered for the requested prefix.
pub fn not_found() -> Response<Body> {
    json_response(StatusCode::NOT_FOUND, json!({ "message": "not_found" }))
}

/// The caller's request could not be read.
pub fn bad_request(message: &str) -> Response<Body> {
    json_response(StatusCode::BAD_REQUEST, json!({ "error": message }))
}

/// Dispatch failed: backend error, deadline exceeded, or circuit open.
pub fn bad_gateway(message: &str) -> Response<Body> {
    json_response(
        StatusCode::BAD_GATEWAY,
        json!({ "error": "bad_gateway", "message": message }),
    )
}

/// Unexpected gateway-side failure.
pub fn internal_error(message: &str) -> Response<Body> {
    json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": message }),
    )
}

/// Explicit unavailability signal.
pub fn service_unavailable(message: &str) -> Response<Body> {
    json_response(
        StatusCode::SERVICE_UNAVAILABLE,
        json!({ "error": message }),
    )
}
