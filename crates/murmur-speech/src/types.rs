use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Synchronous synthesis request
///
/// Exactly one of `reference_audio` (inline base64) or `reference_url` must
/// be present.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechRequest {
    /// Base64-encoded reference audio
    #[serde(default)]
    pub reference_audio: Option<String>,
    /// Remote URL to fetch the reference audio from
    #[serde(default)]
    pub reference_url: Option<Url>,
    /// Transcript of the reference audio; the engine derives one when absent
    #[serde(default)]
    pub reference_text: Option<String>,
    /// Text to synthesize
    pub input: String,
    /// Speech speed multiplier (0.25 to 4.0, default 1.0)
    #[serde(default)]
    pub speed: Option<f64>,
    /// Cross-fade between generated segments in seconds (default 0.15)
    #[serde(default)]
    pub cross_fade_duration: Option<f64>,
}

/// Synchronous synthesis response
#[derive(Debug, Serialize, Deserialize)]
pub struct SpeechResponse {
    /// Base64-encoded WAV container
    pub audio: String,
    /// Sample rate of the generated audio
    pub sample_rate: u32,
    /// Length of the generated audio in seconds
    pub duration_secs: f64,
}

/// How an async job delivers its result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Result held on the job record, returned by the status endpoint
    #[default]
    Inline,
    /// Result uploaded to object storage; the status carries the object URL
    Storage,
}

/// Async job submission request
#[derive(Debug, Clone, Deserialize)]
pub struct JobRequest {
    #[serde(flatten)]
    pub speech: SpeechRequest,
    /// Delivery mode for the result
    #[serde(default)]
    pub deliver: Delivery,
    /// URL to POST a completion callback to
    #[serde(default)]
    pub callback_url: Option<Url>,
}

/// Lifecycle state of an async job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Succeeded,
    Failed,
}

/// Response to a job submission
#[derive(Debug, Serialize, Deserialize)]
pub struct JobSubmitted {
    pub id: Uuid,
    pub status: JobState,
}

/// Job status as returned by the status endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub id: Uuid,
    pub status: JobState,
    /// Base64 WAV for succeeded inline-delivery jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    /// Object URL for succeeded storage-delivery jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Failure message for failed jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Webhook callback payload POSTed on job completion
#[derive(Debug, Serialize, Deserialize)]
pub struct JobCallback {
    pub id: Uuid,
    pub status: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response to a file-variant synthesis
#[derive(Debug, Serialize, Deserialize)]
pub struct SpeechFileResponse {
    pub id: Uuid,
    /// Relative download path for the generated file
    pub url: String,
    pub sample_rate: u32,
    pub duration_secs: f64,
    /// Seconds until the file expires
    pub expires_in_secs: u64,
}
