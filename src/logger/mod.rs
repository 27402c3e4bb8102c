//! Logger module
//!
//! Provides logging utilities for the time server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use std::net::SocketAddr;

use crate::config::{Config, LogLevel, LoggingConfig};

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    writer::init(config)
}

pub fn log_info(message: &str) {
    writer::write(LogLevel::Info, message);
}

pub fn log_debug(message: &str) {
    writer::write(LogLevel::Debug, message);
}

pub fn log_warning(message: &str) {
    writer::write(LogLevel::Warn, message);
}

pub fn log_error(message: &str) {
    writer::write(LogLevel::Error, message);
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    log_info(&format!(
        "time server listening on http://{addr}{}",
        config.http.endpoint_path
    ));
    log_info(&format!("Log level: {}", config.logging.level));
    match config.server.workers {
        Some(workers) => log_info(&format!("Worker threads: {workers}")),
        None => log_info("Worker threads: CPU cores"),
    }
    if let Some(max) = config.performance.max_connections {
        log_info(&format!("Max connections: {max}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        log_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        log_info(&format!("Error log: {path}"));
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_rejected(active: usize, max: u64) {
    log_warning(&format!(
        "Max connections reached: {active}/{max}. Connection rejected."
    ));
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    log_error(&format!("Failed to serve connection: {err}"));
}

pub fn log_connection_timeout(secs: u64) {
    log_warning(&format!("Connection timeout after {secs} seconds"));
}

pub fn log_shutdown_requested(signal: &str) {
    log_info(&format!("[SIGNAL] {signal} received, shutting down"));
}

pub fn log_shutdown_complete(remaining: usize) {
    if remaining == 0 {
        log_info("Shutdown complete, all connections closed");
    } else {
        log_warning(&format!(
            "Shutdown grace period elapsed with {remaining} connection(s) still open"
        ));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    writer::write_access(&entry.format(format));
}
