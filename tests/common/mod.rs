//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use drain_chain::config::{Role, ServiceConfig};
use drain_chain::error::ServiceError;
use drain_chain::http::{AppState, HttpServer};
use drain_chain::lifecycle::{startup, Shutdown, TerminationSignal};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

/// Config with fast defaults for tests.
pub fn test_config(role: Role) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.role = role;
    config.listener.bind_address = "127.0.0.1:0".into();
    config.drain.convergence_delay_ms = 500;
    config.drain.shutdown_grace_secs = 5;
    config.work.min_ms = 20;
    config.work.max_ms = 40;
    config.downstream.connect_timeout_ms = 1_000;
    config.downstream.response_timeout_ms = 1_000;
    config
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Start an HTTP server on an ephemeral port.
pub async fn spawn_server(config: ServiceConfig) -> (SocketAddr, AppState, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    let state = server.state().clone();
    let shutdown = Shutdown::new();
    tokio::spawn(server.run(listener, shutdown.clone()));
    (addr, state, shutdown)
}

/// A full service run; send on the returned channel to deliver the
/// termination signal.
pub struct RunningService {
    pub addr: SocketAddr,
    pub signal: oneshot::Sender<TerminationSignal>,
    pub handle: JoinHandle<Result<(), ServiceError>>,
}

pub async fn spawn_service(config: ServiceConfig) -> RunningService {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (signal, rx) = oneshot::channel();
    let termination = async move { rx.await.unwrap_or(TerminationSignal::Terminate) };
    let handle = tokio::spawn(startup::run(config, listener, termination));
    RunningService { addr, signal, handle }
}

/// An address nothing listens on: connections are refused.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Accepts connections and never answers.
pub async fn start_stalled_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let held: Arc<Mutex<Vec<TcpStream>>> = Arc::default();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            held.lock().await.push(socket);
        }
    });
    addr
}

/// Start a programmable backend; `f` decides status and body per request.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                let (status, body) = f().await;
                let reason = match status {
                    200 => "OK",
                    500 => "Internal Server Error",
                    502 => "Bad Gateway",
                    503 => "Service Unavailable",
                    _ => "Unknown",
                };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

async fn read_request_head(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match tokio::time::timeout(Duration::from_secs(2), socket.read(&mut chunk)).await {
            Ok(Ok(n)) if n > 0 => buf.extend_from_slice(&chunk[..n]),
            _ => return,
        }
    }
}
