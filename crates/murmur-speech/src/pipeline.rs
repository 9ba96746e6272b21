use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use murmur_engine::{Engine, SynthesisRequest, wav};
use secrecy::SecretString;

use crate::{
    error::{Result, SpeechError},
    files::FileStore,
    jobs::{JobStore, send_callback},
    reference::ReferenceAudio,
    storage::ObjectStore,
    types::{Delivery, JobRequest, JobState, JobStatusResponse, JobSubmitted, SpeechRequest},
};

const DEFAULT_SPEED: f64 = 1.0;
const DEFAULT_CROSS_FADE: f64 = 0.15;
const SPEED_RANGE: std::ops::RangeInclusive<f64> = 0.25..=4.0;

/// A finished synthesis, serialized to a WAV container
pub struct GeneratedAudio {
    pub wav: Vec<u8>,
    pub sample_rate: u32,
    pub duration_secs: f64,
}

/// Speech server running the request-to-audio pipeline
///
/// Every transport variant funnels into [`Server::synthesize`]: materialize
/// the reference, invoke the engine, encode the waveform. The variants only
/// differ in how the WAV leaves the process.
pub struct Server {
    engine: Arc<dyn Engine>,
    pub(crate) files: Arc<FileStore>,
    pub(crate) jobs: JobStore,
    storage: Option<ObjectStore>,
    callback_secret: Option<SecretString>,
    max_reference_bytes: usize,
    fetch_timeout: std::time::Duration,
    callback_timeout: std::time::Duration,
}

impl Server {
    /// Run the full pipeline for a request carrying its own reference source
    pub async fn synthesize(&self, request: &SpeechRequest) -> Result<GeneratedAudio> {
        self.validate(request)?;

        let reference = match (&request.reference_audio, &request.reference_url) {
            (Some(encoded), None) => {
                let bytes = BASE64
                    .decode(encoded)
                    .map_err(|e| SpeechError::InvalidRequest(format!("invalid base64 reference audio: {e}")))?;

                if bytes.len() > self.max_reference_bytes {
                    return Err(SpeechError::ReferenceTooLarge {
                        limit_bytes: self.max_reference_bytes,
                    });
                }

                ReferenceAudio::from_bytes(&bytes)?
            }
            (None, Some(url)) => ReferenceAudio::fetch(url, self.max_reference_bytes, self.fetch_timeout).await?,
            _ => {
                return Err(SpeechError::InvalidRequest(
                    "exactly one of reference_audio or reference_url must be provided".to_string(),
                ));
            }
        };

        self.run(request, &reference).await
    }

    /// Run the pipeline with reference bytes supplied out of band (upload variant)
    pub async fn synthesize_with_reference(&self, request: &SpeechRequest, reference: &[u8]) -> Result<GeneratedAudio> {
        self.validate(request)?;

        if reference.len() > self.max_reference_bytes {
            return Err(SpeechError::ReferenceTooLarge {
                limit_bytes: self.max_reference_bytes,
            });
        }

        let reference = ReferenceAudio::from_bytes(reference)?;
        self.run(request, &reference).await
    }

    /// Inference invocation and result encoding
    ///
    /// The reference temp file is dropped by the caller when this returns,
    /// success or not.
    async fn run(&self, request: &SpeechRequest, reference: &ReferenceAudio) -> Result<GeneratedAudio> {
        let synthesis_request = SynthesisRequest {
            reference_path: reference.path().to_path_buf(),
            reference_text: request.reference_text.clone(),
            input: request.input.clone(),
            speed: request.speed.unwrap_or(DEFAULT_SPEED),
            cross_fade_duration: request.cross_fade_duration.unwrap_or(DEFAULT_CROSS_FADE),
        };

        let synthesis = self.engine.synthesize(&synthesis_request).await?;

        tracing::debug!(
            engine = self.engine.name(),
            samples = synthesis.samples.len(),
            sample_rate = synthesis.sample_rate,
            inference_ms = synthesis.metadata.inference.as_millis(),
            "synthesis complete"
        );

        let duration_secs = f64::from(u32::try_from(synthesis.samples.len()).unwrap_or(u32::MAX))
            / f64::from(synthesis.sample_rate.max(1));
        let wav = wav::encode(&synthesis.samples, synthesis.sample_rate)?;

        Ok(GeneratedAudio {
            wav,
            sample_rate: synthesis.sample_rate,
            duration_secs,
        })
    }

    /// Submit an async job
    ///
    /// Request shape errors surface here as 400s; engine failures land on
    /// the job record instead.
    pub fn submit_job(self: &Arc<Self>, request: JobRequest) -> Result<JobSubmitted> {
        self.validate(&request.speech)?;

        if !matches!(
            (&request.speech.reference_audio, &request.speech.reference_url),
            (Some(_), None) | (None, Some(_))
        ) {
            return Err(SpeechError::InvalidRequest(
                "exactly one of reference_audio or reference_url must be provided".to_string(),
            ));
        }

        if request.deliver == Delivery::Storage && self.storage.is_none() {
            return Err(SpeechError::InvalidRequest(
                "storage delivery requested but no object storage is configured".to_string(),
            ));
        }

        let id = self.jobs.insert()?;
        let server = Arc::clone(self);

        tokio::spawn(async move {
            server.run_job(id, request).await;
        });

        tracing::debug!(job = %id, "job submitted");

        Ok(JobSubmitted {
            id,
            status: JobState::Queued,
        })
    }

    async fn run_job(&self, id: uuid::Uuid, request: JobRequest) {
        self.jobs.set_running(id);

        match self.synthesize(&request.speech).await {
            Ok(generated) => match request.deliver {
                Delivery::Inline => {
                    self.jobs.succeed_inline(id, BASE64.encode(&generated.wav), generated.sample_rate);
                }
                Delivery::Storage => {
                    // Checked at submission
                    let Some(ref storage) = self.storage else {
                        self.jobs.fail(id, "object storage not configured".to_string());
                        return;
                    };

                    match storage.put(&format!("{id}.wav"), generated.wav, "audio/wav").await {
                        Ok(url) => self.jobs.succeed_storage(id, url, generated.sample_rate),
                        Err(e) => {
                            tracing::error!(job = %id, error = %e, "storage delivery failed");
                            self.jobs.fail(id, e.client_message());
                        }
                    }
                }
            },
            Err(e) => {
                tracing::error!(job = %id, error = %e, "job synthesis failed");
                self.jobs.fail(id, e.client_message());
            }
        }

        if let Some(ref callback_url) = request.callback_url
            && let Some(payload) = self.jobs.callback_payload(id)
        {
            send_callback(callback_url, &payload, self.callback_secret.as_ref(), self.callback_timeout).await;
        }
    }

    /// Job status lookup
    pub fn job_status(&self, id: uuid::Uuid) -> Result<JobStatusResponse> {
        self.jobs.status(id)
    }

    fn validate(&self, request: &SpeechRequest) -> Result<()> {
        if request.input.trim().is_empty() {
            return Err(SpeechError::InvalidRequest("input text is empty".to_string()));
        }

        if let Some(speed) = request.speed
            && !SPEED_RANGE.contains(&speed)
        {
            return Err(SpeechError::InvalidRequest(format!(
                "speed must be between {} and {}",
                SPEED_RANGE.start(),
                SPEED_RANGE.end()
            )));
        }

        if let Some(cross_fade) = request.cross_fade_duration
            && !(0.0..=10.0).contains(&cross_fade)
        {
            return Err(SpeechError::InvalidRequest(
                "cross_fade_duration must be between 0 and 10 seconds".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for constructing the speech server from configuration
pub struct SpeechServerBuilder<'a> {
    config: &'a murmur_config::Config,
}

impl<'a> SpeechServerBuilder<'a> {
    pub const fn new(config: &'a murmur_config::Config) -> Self {
        Self { config }
    }

    pub fn build(self) -> Result<Server> {
        let engine = murmur_engine::build_engine(&self.config.engine)?;
        let files = Arc::new(FileStore::new(&self.config.speech.spool)?);
        let jobs = JobStore::new(&self.config.speech.jobs);
        let storage = self.config.speech.storage.as_ref().map(ObjectStore::new);

        if storage.is_none() {
            tracing::debug!("no object storage configured; storage delivery disabled");
        }

        Ok(Server {
            engine,
            files,
            jobs,
            storage,
            callback_secret: self.config.speech.jobs.callback_secret.clone(),
            max_reference_bytes: self.config.speech.max_reference_bytes,
            fetch_timeout: self.config.speech.fetch_timeout,
            callback_timeout: self.config.speech.jobs.callback_timeout,
        })
    }
}
