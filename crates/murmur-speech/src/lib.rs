#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! HTTP surface of the speech pipeline
//!
//! Four transport variants over one pipeline: synchronous base64 JSON,
//! multipart upload with a downloadable file, async jobs with webhook
//! callbacks, and object-storage delivery through the job variant.

mod error;
mod files;
mod jobs;
mod pipeline;
mod reference;
mod request;
mod storage;
mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use uuid::Uuid;

pub use error::{Result, SpeechError};
pub use files::FileStore;
pub use pipeline::{GeneratedAudio, Server, SpeechServerBuilder};
pub use types::{
    Delivery, JobCallback, JobRequest, JobState, JobStatusResponse, JobSubmitted, SpeechFileResponse, SpeechRequest,
    SpeechResponse,
};
use request::{ExtractPayload, ExtractSpeechForm};
use tokio_util::sync::CancellationToken;

/// Build the speech server from configuration
pub fn build_server(config: &murmur_config::Config) -> anyhow::Result<Arc<Server>> {
    let server = Arc::new(
        SpeechServerBuilder::new(config)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize speech server: {e}"))?,
    );
    Ok(server)
}

/// Create the endpoint router for speech synthesis
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new()
        .route("/v1/audio/speech", post(synthesize))
        .route("/v1/audio/speech/files", post(synthesize_to_file))
        .route("/v1/audio/speech/files/{id}", get(download_file))
        .route("/v1/audio/speech/jobs", post(submit_job))
        .route("/v1/audio/speech/jobs/{id}", get(job_status))
}

/// Spawn the spool and job-record sweepers; call once at startup
pub fn spawn_sweeper(server: &Arc<Server>, shutdown: CancellationToken) {
    FileStore::spawn_sweeper(Arc::clone(&server.files), shutdown.clone());

    let server = Arc::clone(server);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(server.jobs.sweep_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    server.jobs.sweep();
                }
                () = shutdown.cancelled() => {
                    tracing::debug!("job record sweeper stopped");
                    return;
                }
            }
        }
    });
}

/// Handle synchronous synthesis requests (inline base64 response)
async fn synthesize(
    State(server): State<Arc<Server>>,
    ExtractPayload(request): ExtractPayload<SpeechRequest>,
) -> Result<Json<SpeechResponse>> {
    tracing::debug!("speech handler called, input_len={}", request.input.len());

    let generated = server.synthesize(&request).await?;

    Ok(Json(SpeechResponse {
        audio: BASE64.encode(&generated.wav),
        sample_rate: generated.sample_rate,
        duration_secs: generated.duration_secs,
    }))
}

/// Handle the upload variant: multipart in, downloadable file out
async fn synthesize_to_file(
    State(server): State<Arc<Server>>,
    form: ExtractSpeechForm,
) -> Result<Json<SpeechFileResponse>> {
    tracing::debug!("speech file handler called, reference_bytes={}", form.reference.len());

    let generated = server.synthesize_with_reference(&form.request, &form.reference).await?;
    let stored = server.files.store(&generated.wav).await?;

    Ok(Json(SpeechFileResponse {
        id: stored.id,
        url: format!("/v1/audio/speech/files/{}", stored.id),
        sample_rate: generated.sample_rate,
        duration_secs: generated.duration_secs,
        expires_in_secs: stored.expires_in.as_secs(),
    }))
}

/// Serve a spooled file until it expires
///
/// The WAV is streamed off disk rather than buffered.
async fn download_file(
    State(server): State<Arc<Server>>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response> {
    let path = server.files.open(id)?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| SpeechError::NotFound(format!("file {id}")))?;

    axum::response::Response::builder()
        .header(http::header::CONTENT_TYPE, "audio/wav")
        .header(
            http::header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{id}.wav\""),
        )
        .body(axum::body::Body::from_stream(tokio_util::io::ReaderStream::new(file)))
        .map_err(|e| SpeechError::InternalError(Some(e.to_string())))
}

/// Handle async job submission (202 Accepted)
async fn submit_job(
    State(server): State<Arc<Server>>,
    ExtractPayload(request): ExtractPayload<JobRequest>,
) -> Result<(http::StatusCode, Json<JobSubmitted>)> {
    let submitted = server.submit_job(request)?;
    Ok((http::StatusCode::ACCEPTED, Json(submitted)))
}

/// Handle job status polls
async fn job_status(State(server): State<Arc<Server>>, Path(id): Path<Uuid>) -> Result<Json<JobStatusResponse>> {
    Ok(Json(server.job_status(id)?))
}
