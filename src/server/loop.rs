// Server loop module
// Accepts connections until the shutdown future resolves

use std::future::Future;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::error::Result;
use crate::router::Router;

/// Accept connections on `listener` and serve them with `router`.
///
/// Accept errors are logged and the loop keeps going. Returns once
/// `shutdown` resolves; connections already accepted finish on their own
/// tasks.
pub async fn serve<F>(listener: TcpListener, router: Arc<Router>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &router, &active_connections);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to accept connection");
                    }
                }
            }

            () = &mut shutdown => {
                tracing::info!(
                    addr = ?listener.local_addr().ok(),
                    "shutdown requested, no longer accepting connections"
                );
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::error::BoxError;
    use crate::server::create_reusable_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    async fn get_user(c: Context) -> Result<(), BoxError> {
        let name = c.param("name").unwrap_or_default().to_owned();
        c.json(&serde_json::json!({ "name": name }))
    }

    async fn roundtrip(addr: std::net::SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn test_serves_over_tcp_until_shutdown() {
        let mut router = Router::new();
        router.access_log(false).get("/users/{name}", get_user).unwrap();

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, Arc::new(router), async {
            let _ = stop_rx.await;
        }));

        let response = roundtrip(
            addr,
            "GET /users/stitch HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response.contains("content-type: application/json"), "{response}");
        assert!(response.ends_with(r#"{"name":"stitch"}"#), "{response}");

        let response = roundtrip(
            addr,
            "GET /missing HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found"), "{response}");

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
