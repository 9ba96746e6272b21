//! Async job records and completion callbacks
//!
//! The store tracks job lifecycle state (`Queued → Running → Succeeded |
//! Failed`); orchestration of the actual pipeline run lives on the speech
//! [`Server`](crate::Server). Callbacks are at-most-once: one POST, a warning
//! log on failure, no retries. Terminal records stay pollable for the
//! configured retention and are then evicted by a background sweep.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use murmur_config::JobsConfig;
use secrecy::{ExposeSecret, SecretString};
use url::Url;
use uuid::Uuid;

use crate::error::{Result, SpeechError};
use crate::types::{JobCallback, JobState, JobStatusResponse};

/// Header carrying the shared callback secret
const CALLBACK_SECRET_HEADER: &str = "X-Murmur-Secret";

/// In-memory store of async synthesis jobs
pub struct JobStore {
    jobs: DashMap<Uuid, JobRecord>,
    max_pending: usize,
    /// Jobs in `Queued` or `Running` state; the capacity check and the
    /// increment must be a single atomic step
    active: AtomicUsize,
    retention: Duration,
    sweep_interval: Duration,
}

struct JobRecord {
    state: JobState,
    audio: Option<String>,
    sample_rate: Option<u32>,
    audio_url: Option<String>,
    error: Option<String>,
    completed_at: Option<Instant>,
}

impl JobRecord {
    /// Move to a terminal state; false if the record already is terminal
    fn finish(&mut self, state: JobState) -> bool {
        if matches!(self.state, JobState::Succeeded | JobState::Failed) {
            return false;
        }
        self.state = state;
        self.completed_at = Some(Instant::now());
        true
    }
}

impl JobStore {
    pub fn new(config: &JobsConfig) -> Self {
        Self {
            jobs: DashMap::new(),
            max_pending: config.max_pending,
            active: AtomicUsize::new(0),
            retention: config.retention,
            sweep_interval: config.sweep_interval,
        }
    }

    pub const fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Register a new job in `Queued` state
    ///
    /// The record is visible before the worker task starts, so a status
    /// poll racing the submission sees `Queued` rather than 404.
    pub fn insert(&self) -> Result<Uuid> {
        if self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |active| {
                (active < self.max_pending).then_some(active + 1)
            })
            .is_err()
        {
            return Err(SpeechError::TooManyJobs);
        }

        let id = Uuid::new_v4();
        self.jobs.insert(
            id,
            JobRecord {
                state: JobState::Queued,
                audio: None,
                sample_rate: None,
                audio_url: None,
                error: None,
                completed_at: None,
            },
        );

        Ok(id)
    }

    pub fn set_running(&self, id: Uuid) {
        if let Some(mut record) = self.jobs.get_mut(&id) {
            record.state = JobState::Running;
        }
    }

    pub fn succeed_inline(&self, id: Uuid, audio: String, sample_rate: u32) {
        if let Some(mut record) = self.jobs.get_mut(&id)
            && record.finish(JobState::Succeeded)
        {
            record.audio = Some(audio);
            record.sample_rate = Some(sample_rate);
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    pub fn succeed_storage(&self, id: Uuid, audio_url: String, sample_rate: u32) {
        if let Some(mut record) = self.jobs.get_mut(&id)
            && record.finish(JobState::Succeeded)
        {
            record.audio_url = Some(audio_url);
            record.sample_rate = Some(sample_rate);
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    pub fn fail(&self, id: Uuid, error: String) {
        if let Some(mut record) = self.jobs.get_mut(&id)
            && record.finish(JobState::Failed)
        {
            record.error = Some(error);
            self.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Job status for the status endpoint
    pub fn status(&self, id: Uuid) -> Result<JobStatusResponse> {
        let record = self.jobs.get(&id).ok_or_else(|| SpeechError::NotFound(format!("job {id}")))?;

        Ok(JobStatusResponse {
            id,
            status: record.state,
            audio: record.audio.clone(),
            sample_rate: record.sample_rate,
            audio_url: record.audio_url.clone(),
            error: record.error.clone(),
        })
    }

    /// Snapshot a terminal record as a callback payload
    pub fn callback_payload(&self, id: Uuid) -> Option<JobCallback> {
        self.jobs.get(&id).map(|record| JobCallback {
            id,
            status: record.state,
            audio: record.audio.clone(),
            sample_rate: record.sample_rate,
            audio_url: record.audio_url.clone(),
            error: record.error.clone(),
        })
    }

    /// Evict terminal records past their retention, returning the count
    ///
    /// Queued and running jobs are never evicted.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<Uuid> = self
            .jobs
            .iter()
            .filter(|record| record.completed_at.is_some_and(|done| done + self.retention <= now))
            .map(|record| *record.key())
            .collect();

        let removed = expired.len();
        for id in &expired {
            self.jobs.remove(id);
        }

        if removed > 0 {
            tracing::debug!(removed, "swept expired job records");
        }

        removed
    }
}

/// POST a completion callback, logging and swallowing failures
pub async fn send_callback(url: &Url, payload: &JobCallback, secret: Option<&SecretString>, timeout: Duration) {
    let mut builder = murmur_engine::http_client().post(url.clone()).json(payload).timeout(timeout);

    if let Some(secret) = secret {
        builder = builder.header(CALLBACK_SECRET_HEADER, secret.expose_secret());
    }

    match builder.send().await {
        Ok(response) if response.status().is_success() => {
            tracing::debug!(job = %payload.id, "callback delivered");
        }
        Ok(response) => {
            tracing::warn!(job = %payload.id, status = %response.status(), "callback rejected");
        }
        Err(e) => {
            tracing::warn!(job = %payload.id, error = %e, "callback delivery failed");
        }
    }
}
