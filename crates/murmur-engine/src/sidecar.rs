use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use murmur_config::SidecarEngineConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use crate::{
    Engine, EngineMetadata, Synthesis, SynthesisRequest,
    error::EngineError,
    http_client::http_client,
};

/// HTTP inference sidecar
///
/// The sidecar hosts the pretrained model and exposes a single synthesis
/// endpoint. Reference audio is posted as a multipart file together with the
/// text fields; the response carries base64 16-bit PCM.
pub struct SidecarEngine {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl SidecarEngine {
    pub fn new(config: &SidecarEngineConfig) -> Self {
        Self {
            client: http_client(),
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[derive(serde::Deserialize)]
struct SidecarResponse {
    /// Base64 of little-endian 16-bit PCM mono samples
    audio: String,
    sample_rate: u32,
    #[serde(default)]
    reference_text: Option<String>,
}

#[async_trait]
impl Engine for SidecarEngine {
    async fn synthesize(&self, request: &SynthesisRequest) -> crate::Result<Synthesis> {
        let url = format!("{}/synthesize", self.base_url);

        let reference = tokio::fs::read(&request.reference_path)
            .await
            .map_err(|e| EngineError::InternalError(Some(format!("failed to read reference audio: {e}"))))?;

        tracing::debug!(
            "sidecar synthesis request: input_len={}, reference_bytes={}",
            request.input.len(),
            reference.len(),
        );

        let mut form = reqwest::multipart::Form::new()
            .part(
                "reference_audio",
                reqwest::multipart::Part::bytes(reference)
                    .file_name("reference.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| EngineError::InternalError(Some(e.to_string())))?,
            )
            .text("input", request.input.clone())
            .text("speed", request.speed.to_string())
            .text("cross_fade_duration", request.cross_fade_duration.to_string());

        if let Some(ref text) = request.reference_text {
            form = form.text("reference_text", text.clone());
        }

        let mut builder = self.client.post(&url).multipart(form).timeout(self.timeout);

        if let Some(ref api_key) = self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let started = Instant::now();

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                return EngineError::Timeout(self.timeout.as_secs());
            }
            tracing::error!("sidecar request failed: {e}");
            EngineError::ConnectionError(format!("Failed to reach inference sidecar: {e}"))
        })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

            tracing::error!("sidecar error ({status}): {error_text}");

            return Err(match status.as_u16() {
                400 => EngineError::InvalidRequest(error_text),
                401 => EngineError::AuthenticationFailed(error_text),
                _ => EngineError::EngineApiError {
                    status: status.as_u16(),
                    message: error_text,
                },
            });
        }

        let body: SidecarResponse = response.json().await.map_err(|e| {
            tracing::error!("failed to parse sidecar response: {e}");
            EngineError::InternalError(None)
        })?;

        let samples = decode_pcm16(&body.audio)?;

        if samples.is_empty() {
            return Err(EngineError::BadAudio("sidecar returned an empty waveform".to_string()));
        }

        tracing::debug!(
            "sidecar synthesis complete: {} samples at {} Hz",
            samples.len(),
            body.sample_rate,
        );

        Ok(Synthesis {
            samples,
            sample_rate: body.sample_rate,
            metadata: EngineMetadata {
                inference: started.elapsed(),
                reference_transcript: body.reference_text,
            },
        })
    }

    fn name(&self) -> &str {
        "sidecar"
    }
}

/// Decode base64 little-endian 16-bit PCM into f32 samples
fn decode_pcm16(encoded: &str) -> crate::Result<Vec<f32>> {
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| EngineError::BadAudio(format!("invalid base64 audio: {e}")))?;

    if bytes.len() % 2 != 0 {
        return Err(EngineError::BadAudio("odd-length PCM payload".to_string()));
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / f32::from(i16::MAX))
        .collect())
}
