// Connection handling module
// Admission control, per-connection HTTP/1 serving and graceful close

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Counts live connections; slots are released by dropping the guard
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    active: AtomicUsize,
}

/// Occupied connection slot
#[derive(Debug)]
pub struct ConnectionGuard {
    tracker: Arc<ConnectionTracker>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.tracker.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ConnectionTracker {
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Take a slot, or return the current count when `limit` is reached
    pub fn try_acquire(self: &Arc<Self>, limit: Option<u64>) -> Result<ConnectionGuard, usize> {
        // Increment first, then check, so concurrent accepts cannot overshoot
        let prev = self.active.fetch_add(1, Ordering::SeqCst);
        let guard = ConnectionGuard {
            tracker: Arc::clone(self),
        };
        match limit {
            Some(max) if prev >= usize::try_from(max).unwrap_or(usize::MAX) => {
                drop(guard);
                Err(prev)
            }
            _ => Ok(guard),
        }
    }

    /// Wait until every connection is closed or `grace` elapses.
    /// Returns the number still open.
    pub async fn wait_idle(&self, grace: Duration) -> usize {
        let deadline = tokio::time::Instant::now() + grace;
        loop {
            let active = self.active();
            if active == 0 || tokio::time::Instant::now() >= deadline {
                return active;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }
}

/// Admit a freshly accepted stream and serve it on its own task
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    tracker: &Arc<ConnectionTracker>,
    shutdown: &watch::Receiver<bool>,
) {
    let guard = match tracker.try_acquire(state.config.performance.max_connections) {
        Ok(guard) => guard,
        Err(active) => {
            if let Some(max) = state.config.performance.max_connections {
                logger::log_connection_rejected(active, max);
            }
            drop(stream);
            return;
        }
    };

    logger::log_connection_accepted(&peer_addr);

    tokio::spawn(serve_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        shutdown.clone(),
        guard,
    ));
}

/// Serve one connection until the client closes it, the deadline expires,
/// or a server shutdown asks hyper to finish the in-flight request.
async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
    _guard: ConnectionGuard,
) {
    let io = TokioIo::new(stream);
    let perf = &state.config.performance;
    let timeout = state.config.connection_timeout();

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .keep_alive(perf.keep_alive_timeout > 0)
        .header_read_timeout(Duration::from_secs(perf.read_timeout));

    let svc_state = Arc::clone(&state);
    let conn = builder.serve_connection(
        io,
        service_fn(move |req| handler::handle_request(req, Arc::clone(&svc_state), peer_addr)),
    );
    tokio::pin!(conn);

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    let mut draining = *shutdown.borrow();
    if draining {
        conn.as_mut().graceful_shutdown();
    }

    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(err) = result {
                    logger::log_connection_error(&err);
                }
                break;
            }
            changed = shutdown.changed(), if !draining => {
                // A dropped sender also means the server is going away
                if changed.is_err() || *shutdown.borrow() {
                    draining = true;
                    conn.as_mut().graceful_shutdown();
                }
            }
            () = &mut deadline => {
                logger::log_connection_timeout(timeout.as_secs());
                break;
            }
        }
    }
}
