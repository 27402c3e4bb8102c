// Server loop module
// Accepts connections until shutdown, then drains open connections

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;

use super::connection::{accept_connection, ConnectionTracker};
use crate::config::AppState;
use crate::error::ServerError;
use crate::logger;

/// Run the accept loop on `listener` until `shutdown` flips to `true`
/// (or its sender is dropped).
///
/// After the signal the listener is closed, every open connection is asked
/// to finish its current request, and the loop waits up to
/// `server.shutdown_grace` seconds for them.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    let tracker = Arc::new(ConnectionTracker::default());

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &tracker, &shutdown);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                        // Typically EMFILE; back off instead of spinning
                        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    }
                }
            }

            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    drop(listener);
    logger::log_info(&format!(
        "Stopped accepting connections, waiting for {} open connection(s)",
        tracker.active()
    ));
    let remaining = tracker.wait_idle(state.config.shutdown_grace()).await;
    logger::log_shutdown_complete(remaining);
    Ok(())
}
