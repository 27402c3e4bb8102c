//! Timestamp endpoint
//!
//! Samples the clock once per request and answers with
//! `{"unix_timestamp":<secs>,"status":"success"}`.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::clock::{Clock, ClockError};
use crate::http;
use crate::logger;

pub const STATUS_SUCCESS: &str = "success";

/// Response payload, built fresh for every request
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TimestampPayload {
    pub unix_timestamp: u64,
    pub status: &'static str,
}

impl TimestampPayload {
    pub const fn new(unix_timestamp: u64) -> Self {
        Self {
            unix_timestamp,
            status: STATUS_SUCCESS,
        }
    }

    pub fn sample(clock: &dyn Clock) -> Result<Self, ClockError> {
        clock.unix_timestamp().map(Self::new)
    }
}

/// Serve GET/HEAD on the timestamp endpoint
pub fn serve_timestamp(
    clock: &dyn Clock,
    server_name: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let payload = match TimestampPayload::sample(clock) {
        Ok(payload) => payload,
        Err(e) => {
            logger::log_error(&format!("Clock read failed: {e}"));
            return http::build_500_response(server_name, is_head);
        }
    };

    match serde_json::to_vec(&payload) {
        Ok(body) => {
            http::build_json_response(StatusCode::OK, Bytes::from(body), server_name, is_head)
        }
        Err(e) => {
            logger::log_error(&format!("Failed to serialize timestamp payload: {e}"));
            http::build_500_response(server_name, is_head)
        }
    }
}
