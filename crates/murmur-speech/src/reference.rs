//! Reference audio materialization
//!
//! The inference engine consumes reference audio from a filesystem path, so
//! inline and remote references are written to a transient local file first.
//! The file is removed when the [`ReferenceAudio`] is dropped, including on
//! inference failure.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Result, SpeechError};

/// Reference audio persisted to a transient local file
pub struct ReferenceAudio {
    file: NamedTempFile,
}

impl ReferenceAudio {
    /// Write raw reference bytes to a temp file
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(SpeechError::InvalidRequest("reference audio is empty".to_string()));
        }

        let mut file = tempfile::Builder::new()
            .prefix("murmur-ref-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| SpeechError::InternalError(Some(format!("failed to create temp file: {e}"))))?;

        file.write_all(bytes)
            .and_then(|()| file.flush())
            .map_err(|e| SpeechError::InternalError(Some(format!("failed to write reference audio: {e}"))))?;

        Ok(Self { file })
    }

    /// Fetch reference audio from a remote URL, capped at `max_bytes`
    ///
    /// The timeout covers the whole transfer; the shared client carries no
    /// client-wide timeout.
    pub async fn fetch(url: &url::Url, max_bytes: usize, timeout: std::time::Duration) -> Result<Self> {
        let response = murmur_engine::http_client()
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| SpeechError::ReferenceFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::ReferenceFetch(format!("{url} returned {status}")));
        }

        if let Some(length) = response.content_length()
            && length > max_bytes as u64
        {
            return Err(SpeechError::ReferenceTooLarge { limit_bytes: max_bytes });
        }

        let mut bytes = Vec::new();
        let mut response = response;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| SpeechError::ReferenceFetch(e.to_string()))?
        {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(SpeechError::ReferenceTooLarge { limit_bytes: max_bytes });
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!("fetched {} reference bytes from {url}", bytes.len());

        Self::from_bytes(&bytes)
    }

    /// Path the engine should read the reference from
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
