//! Callback and object-storage receivers for integration tests

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

/// Records job completion callbacks
pub struct MockCallback {
    addr: SocketAddr,
    shutdown: CancellationToken,
    received: Arc<Mutex<Vec<ReceivedCallback>>>,
}

#[derive(Clone)]
pub struct ReceivedCallback {
    pub secret: Option<String>,
    pub body: serde_json::Value,
}

impl MockCallback {
    pub async fn start() -> anyhow::Result<Self> {
        let received: Arc<Mutex<Vec<ReceivedCallback>>> = Arc::default();

        let app = Router::new()
            .route("/hook", routing::post(handle_callback))
            .with_state(Arc::clone(&received));

        let (addr, shutdown) = spawn(app).await?;

        Ok(Self { addr, shutdown, received })
    }

    pub fn url(&self) -> String {
        format!("http://{}/hook", self.addr)
    }

    pub fn received(&self) -> Vec<ReceivedCallback> {
        self.received.lock().unwrap().clone()
    }

    /// Poll until one callback arrives or the deadline passes
    pub async fn wait_for_callback(&self) -> Option<ReceivedCallback> {
        for _ in 0..100 {
            if let Some(callback) = self.received().into_iter().next() {
                return Some(callback);
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        None
    }
}

impl Drop for MockCallback {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_callback(
    State(received): State<Arc<Mutex<Vec<ReceivedCallback>>>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> StatusCode {
    let secret = headers
        .get("x-murmur-secret")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    received.lock().unwrap().push(ReceivedCallback { secret, body });

    StatusCode::OK
}

/// Records object uploads (`PUT /{bucket}/{key}`)
pub struct MockStorage {
    addr: SocketAddr,
    shutdown: CancellationToken,
    objects: Arc<Mutex<Vec<StoredObject>>>,
}

#[derive(Clone)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub bytes: Vec<u8>,
}

impl MockStorage {
    pub async fn start() -> anyhow::Result<Self> {
        let objects: Arc<Mutex<Vec<StoredObject>>> = Arc::default();

        let app = Router::new()
            .route("/{bucket}/{key}", routing::put(handle_put))
            .with_state(Arc::clone(&objects));

        let (addr, shutdown) = spawn(app).await?;

        Ok(Self { addr, shutdown, objects })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }
}

impl Drop for MockStorage {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_put(
    State(objects): State<Arc<Mutex<Vec<StoredObject>>>>,
    Path((bucket, key)): Path<(String, String)>,
    body: axum::body::Bytes,
) -> StatusCode {
    objects.lock().unwrap().push(StoredObject {
        bucket,
        key,
        bytes: body.to_vec(),
    });

    StatusCode::OK
}

async fn spawn(app: Router) -> anyhow::Result<(SocketAddr, CancellationToken)> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_clone.cancelled().await;
            })
            .await
            .ok();
    });

    Ok((addr, shutdown))
}
