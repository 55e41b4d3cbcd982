// Connection handling module
// Serves a single accepted TCP connection with hyper's HTTP/1 implementation

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::config::ServerConfig;
use crate::router::Router;

/// Per-connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeOptions {
    /// Keep HTTP/1.1 connections open between requests
    pub keep_alive: bool,
    /// Upper bound on the lifetime of one connection
    pub connection_timeout: Duration,
    /// Reject new connections beyond this many concurrently open ones
    pub max_connections: Option<usize>,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            keep_alive: true,
            connection_timeout: Duration::from_secs(30),
            max_connections: None,
        }
    }
}

impl From<&ServerConfig> for ServeOptions {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            keep_alive: cfg.keep_alive,
            connection_timeout: Duration::from_secs(cfg.connection_timeout_secs),
            max_connections: cfg.max_connections,
        }
    }
}

/// Accept a connection unless the connection limit is reached.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `router` - Shared, read-only router
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    router: &Arc<Router>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment first, then check, so two racing accepts cannot both slip under the limit
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = router.options().max_connections {
        if prev_count >= max_conn {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!(%peer_addr, max_conn, "max connections reached, connection rejected");
            drop(stream);
            return;
        }
    }

    tracing::trace!(%peer_addr, active = prev_count + 1, "connection accepted");
    handle_connection(stream, peer_addr, Arc::clone(router), Arc::clone(conn_counter));
}

/// Serve one connection on its own task.
///
/// Every request on the connection gets a fresh dispatch; nothing is shared
/// between requests except the read-only router.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    router: Arc<Router>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let options = router.options().clone();

        let mut builder = http1::Builder::new();
        builder.keep_alive(options.keep_alive);

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let router = Arc::clone(&router);
                async move { Ok::<_, Infallible>(router.serve(req, Some(peer_addr)).await) }
            }),
        );

        match tokio::time::timeout(options.connection_timeout, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::debug!(%peer_addr, error = %err, "failed to serve connection"),
            Err(_) => tracing::warn!(
                %peer_addr,
                timeout_secs = options.connection_timeout.as_secs(),
                "connection timed out"
            ),
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
