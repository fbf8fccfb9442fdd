//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use cotacao_relay::{RelayConfig, RelayServer, Shutdown, Store};

pub const PROVIDER_PATH: &str = "/json/last/USD-BRL";

/// Start a programmable mock backend on an ephemeral port.
///
/// `f` is called once per connection and returns the status and body to send.
/// Returns the bound address and a counter of accepted connections.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, Arc<AtomicU32>)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let reason = match status {
                            200 => "OK",
                            404 => "Not Found",
                            500 => "Internal Server Error",
                            502 => "Bad Gateway",
                            503 => "Service Unavailable",
                            _ => "Unknown",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            reason,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, calls)
}

/// Mock provider answering `{"USDBRL":{"bid":<bid>}}` after `delay`.
pub async fn start_provider(bid: &'static str, delay: Duration) -> (SocketAddr, Arc<AtomicU32>) {
    start_programmable_backend(move || async move {
        tokio::time::sleep(delay).await;
        (200, format!(r#"{{"USDBRL":{{"code":"USD","codein":"BRL","bid":"{}"}}}}"#, bid))
    })
    .await
}

/// Config pointing the relay at `provider`, with budgets loose enough for CI.
pub fn relay_config(provider: SocketAddr) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.upstream.url = format!("http://{}{}", provider, PROVIDER_PATH);
    config.timeouts.request_ms = 2000;
    config.timeouts.upstream_ms = 2000;
    config.timeouts.persist_ms = 1000;
    config
}

/// Start the relay on an ephemeral port. Returns its address and the shutdown trigger.
pub async fn start_relay(config: RelayConfig, store: Store) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = RelayServer::new(config, store).unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

pub fn endpoint(relay: SocketAddr) -> String {
    format!("http://{}/cotacao", relay)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
