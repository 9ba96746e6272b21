//! Spool store for the file delivery variant
//!
//! Generated WAV files are written under a spool directory keyed by UUID and
//! served by the download endpoint until their TTL lapses. A background
//! sweeper unlinks expired files; the download path checks expiry itself so
//! an expired file is gone from the API even before the sweeper runs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use murmur_config::SpoolConfig;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{Result, SpeechError};

/// Spooled audio files awaiting download
pub struct FileStore {
    dir: PathBuf,
    ttl: Duration,
    sweep_interval: Duration,
    entries: DashMap<Uuid, FileEntry>,
}

struct FileEntry {
    path: PathBuf,
    expires_at: Instant,
}

/// Handle to a stored file
pub struct StoredFile {
    pub id: Uuid,
    pub expires_in: Duration,
}

impl FileStore {
    /// Create the store, ensuring the spool directory exists
    pub fn new(config: &SpoolConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.dir)
            .map_err(|e| SpeechError::InternalError(Some(format!("failed to create spool dir: {e}"))))?;

        Ok(Self {
            dir: config.dir.clone(),
            ttl: config.ttl,
            sweep_interval: config.sweep_interval,
            entries: DashMap::new(),
        })
    }

    /// Write a generated WAV into the spool
    pub async fn store(&self, wav: &[u8]) -> Result<StoredFile> {
        let id = Uuid::new_v4();
        let path = self.dir.join(format!("{id}.wav"));

        tokio::fs::write(&path, wav)
            .await
            .map_err(|e| SpeechError::InternalError(Some(format!("failed to spool audio: {e}"))))?;

        self.entries.insert(
            id,
            FileEntry {
                path,
                expires_at: Instant::now() + self.ttl,
            },
        );

        tracing::debug!(%id, bytes = wav.len(), "spooled generated audio");

        Ok(StoredFile { id, expires_in: self.ttl })
    }

    /// Look up a stored file for download
    ///
    /// Expired entries answer 404 even if the sweeper has not unlinked them yet.
    pub fn open(&self, id: Uuid) -> Result<PathBuf> {
        let entry = self.entries.get(&id).ok_or_else(|| SpeechError::NotFound(format!("file {id}")))?;

        if entry.expires_at <= Instant::now() {
            return Err(SpeechError::NotFound(format!("file {id}")));
        }

        Ok(entry.path.clone())
    }

    /// Remove expired entries and unlink their files, returning the count
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<(Uuid, PathBuf)> = self
            .entries
            .iter()
            .filter(|entry| entry.expires_at <= now)
            .map(|entry| (*entry.key(), entry.path.clone()))
            .collect();

        let mut removed = 0;
        for (id, path) in expired {
            self.entries.remove(&id);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => removed += 1,
                Err(e) => tracing::warn!(%id, error = %e, "failed to unlink expired file"),
            }
        }

        if removed > 0 {
            tracing::debug!(removed, "swept expired spool files");
        }

        removed
    }

    /// Spawn the background sweeper, stopped by the cancellation token
    pub fn spawn_sweeper(store: Arc<Self>, shutdown: CancellationToken) {
        let interval = store.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        store.sweep().await;
                    }
                    () = shutdown.cancelled() => {
                        tracing::debug!("spool sweeper stopped");
                        return;
                    }
                }
            }
        });
    }
}
