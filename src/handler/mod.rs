//! Request handler module
//!
//! Routes every request to the single timestamp endpoint or to the
//! 404/405/preflight answers around it.

pub mod router;
pub mod timestamp;

// Re-export main entry point
pub use router::handle_request;
