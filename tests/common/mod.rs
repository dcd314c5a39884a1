//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anime_records::config::ServiceConfig;
use anime_records::http::server::{build_router, AppState};
use anime_records::http::HttpServer;
use anime_records::lifecycle::Shutdown;
use anime_records::store::RecordStore;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceExt;

pub const SEED: &str = r#"[
    {"id": "1", "name": "Akira", "genre": "Action", "year": 1988, "author": "Katsuhiro Otomo"},
    {"id": "2", "name": "Paprika", "genre": "Sci-Fi", "year": 2006, "author": "Yasutaka Tsutsui"},
    {"id": "3", "name": "Perfect Blue", "genre": "Thriller", "year": 1997, "author": "Yoshikazu Takeuchi"}
]"#;

/// A backing file in a temporary directory, optionally pre-filled.
pub struct Fixture {
    pub dir: TempDir,
    pub config: ServiceConfig,
}

impl Fixture {
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServiceConfig::default();
        config.storage.data_file = dir.path().join("anime.json");
        config.listener.bind_address = "127.0.0.1:0".into();
        Self { dir, config }
    }

    #[allow(dead_code)]
    pub fn seeded() -> Self {
        let fixture = Self::empty();
        std::fs::write(&fixture.config.storage.data_file, SEED).unwrap();
        fixture
    }

    pub async fn store(&self) -> Arc<RecordStore> {
        Arc::new(RecordStore::open(self.config.storage.data_file.clone()).await)
    }

    #[allow(dead_code)]
    pub async fn app(&self) -> (Router, Arc<RecordStore>) {
        let store = self.store().await;
        let state = AppState::new(store.clone(), &self.config);
        (build_router(&self.config, state), store)
    }
}

/// Response pieces returned by [`send`].
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

/// Drive one request through the router in-process.
#[allow(dead_code)]
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<&str>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_default())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Start a real server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_server(
    fixture: &Fixture,
) -> (SocketAddr, Shutdown, JoinHandle<Result<(), std::io::Error>>) {
    let store = fixture.store().await;
    let listener = TcpListener::bind(&fixture.config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&fixture.config, store);
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown, handle)
}
