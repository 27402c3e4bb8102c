//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: path check, method dispatch
//! and access logging.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};

use super::timestamp;
use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};

/// Main entry point for HTTP request handling
///
/// Generic over the body type: the endpoint never reads request bodies.
#[allow(clippy::unused_async)]
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let logging = &state.config.logging;
    let entry = logging
        .access_log
        .then(|| AccessLogEntry::from_request(&req, peer_addr));

    let response = route_request(&req, &state);

    if let Some(entry) = entry {
        let entry = finish_access_entry(entry, &response, started.elapsed());
        logger::log_access(&entry, &logging.access_log_format);
    }

    Ok(response)
}

/// Fill the response side of an access log entry; HEAD bodies count as 0 bytes
fn finish_access_entry(
    mut entry: AccessLogEntry,
    response: &Response<Full<Bytes>>,
    elapsed: Duration,
) -> AccessLogEntry {
    let body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.complete(response.status().as_u16(), body_bytes, elapsed);
    entry
}

fn route_request<B>(req: &Request<B>, state: &AppState) -> Response<Full<Bytes>> {
    let server_name = state.config.http.server_name.as_str();

    if req.uri().path() != state.config.http.endpoint_path {
        return http::build_404_response(server_name);
    }

    match req.method() {
        &Method::GET => timestamp::serve_timestamp(state.clock.as_ref(), server_name, false),
        &Method::HEAD => timestamp::serve_timestamp(state.clock.as_ref(), server_name, true),
        &Method::OPTIONS => http::build_options_response(server_name),
        method => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            http::build_405_response(server_name)
        }
    }
}
