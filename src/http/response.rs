//! HTTP response building module
//!
//! Builders for every response the endpoint can produce. CORS and
//! content-type headers are attached here and nowhere else.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE, ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, SERVER,
};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_METHODS: &str = "GET";
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

const INTERNAL_ERROR_BODY: &str = r#"{"error":"Internal server error"}"#;

fn with_cors(builder: Builder) -> Builder {
    builder
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, CORS_ALLOW_ORIGIN)
        .header(ACCESS_CONTROL_ALLOW_METHODS, CORS_ALLOW_METHODS)
}

/// Build a JSON response with CORS headers
///
/// For HEAD requests the body is dropped but `Content-Length` still
/// reports the size a GET would have returned.
pub fn build_json_response(
    status: StatusCode,
    body: Bytes,
    server_name: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = body.len();
    let body = if is_head { Bytes::new() } else { body };

    with_cors(Response::builder().status(status))
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(CONTENT_LENGTH, content_length)
        .header(CACHE_CONTROL, "no-store")
        .header(SERVER, server_name)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 500 response for faults inside the handler (e.g. clock errors)
pub fn build_500_response(server_name: &str, is_head: bool) -> Response<Full<Bytes>> {
    build_json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        Bytes::from_static(INTERNAL_ERROR_BODY.as_bytes()),
        server_name,
        is_head,
    )
}

/// Build OPTIONS response (CORS preflight)
pub fn build_options_response(server_name: &str) -> Response<Full<Bytes>> {
    with_cors(Response::builder().status(StatusCode::NO_CONTENT))
        .header(ALLOW, ALLOWED_METHODS)
        .header(ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type")
        .header(ACCESS_CONTROL_MAX_AGE, "86400")
        .header(CACHE_CONTROL, "no-store")
        .header(SERVER, server_name)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(server_name: &str) -> Response<Full<Bytes>> {
    with_cors(Response::builder().status(StatusCode::METHOD_NOT_ALLOWED))
        .header(CONTENT_TYPE, "text/plain")
        .header(ALLOW, ALLOWED_METHODS)
        .header(CACHE_CONTROL, "no-store")
        .header(SERVER, server_name)
        .body(Full::new(Bytes::from_static(b"405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from_static(b"405 Method Not Allowed")))
        })
}

/// Build 404 Not Found response
pub fn build_404_response(server_name: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(CONTENT_TYPE, "text/plain")
        .header(SERVER, server_name)
        .body(Full::new(Bytes::from_static(b"404 Not Found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from_static(b"404 Not Found")))
        })
}

fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
