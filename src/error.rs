//! Server error types
//!
//! Startup and runtime failures of the listener side. Request-level faults
//! never surface here: they are turned into HTTP responses by the handler.

use std::io;
use std::net::{AddrParseError, SocketAddr};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// `host:port` from the configuration is not a socket address
    #[error("invalid listen address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("listener I/O error: {0}")]
    Io(#[from] io::Error),
}
