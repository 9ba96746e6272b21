//! Mock inference sidecar for integration tests
//!
//! Speaks the sidecar wire contract: multipart synthesis request in, JSON
//! with base64 16-bit PCM out.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio_util::sync::CancellationToken;

/// Mock sidecar that returns a fixed waveform
pub struct MockEngine {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockEngineState>,
}

struct MockEngineState {
    request_count: AtomicU32,
    /// Number of requests to fail with 500 before succeeding (0 = never fail)
    fail_count: AtomicU32,
    sample_count: usize,
    sample_rate: u32,
}

impl MockEngine {
    /// Start the mock sidecar, returning immediately
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(0).await
    }

    /// Start a mock sidecar that fails the first `n` requests with 500
    pub async fn start_failing(n: u32) -> anyhow::Result<Self> {
        Self::start_inner(n).await
    }

    async fn start_inner(fail_count: u32) -> anyhow::Result<Self> {
        let state = Arc::new(MockEngineState {
            request_count: AtomicU32::new(0),
            fail_count: AtomicU32::new(fail_count),
            sample_count: 2400,
            sample_rate: 24_000,
        });

        let app = Router::new()
            .route("/synthesize", routing::post(handle_synthesize))
            .with_state(Arc::clone(&state));

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

        Ok(Self { addr, shutdown, state })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::SeqCst)
    }

    /// Sample rate of the canned waveform
    pub const fn sample_rate(&self) -> u32 {
        24_000
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_synthesize(State(state): State<Arc<MockEngineState>>, mut multipart: Multipart) -> impl IntoResponse {
    state.request_count.fetch_add(1, Ordering::SeqCst);

    if state
        .fail_count
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    {
        return (StatusCode::INTERNAL_SERVER_ERROR, "model exploded").into_response();
    }

    let mut saw_reference = false;
    let mut input: Option<String> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name().unwrap_or("") {
            "reference_audio" => {
                let bytes = field.bytes().await.unwrap_or_default();
                saw_reference = !bytes.is_empty();
            }
            "input" => {
                input = field.text().await.ok();
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    if !saw_reference || input.as_deref().is_none_or(str::is_empty) {
        return (StatusCode::BAD_REQUEST, "missing reference_audio or input").into_response();
    }

    // Canned waveform: silence
    let pcm = vec![0u8; state.sample_count * 2];

    Json(serde_json::json!({
        "audio": BASE64.encode(pcm),
        "sample_rate": state.sample_rate,
    }))
    .into_response()
}
