use murmur_config::StorageConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{Result, SpeechError};

/// Object storage client for job delivery
///
/// Talks plain HTTP to an S3-compatible endpoint: `PUT {base}/{bucket}/{key}`
/// with an optional bearer token.
pub struct ObjectStore {
    client: Client,
    base_url: String,
    bucket: String,
    auth_token: Option<SecretString>,
}

impl ObjectStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            client: murmur_engine::http_client(),
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            auth_token: config.auth_token.clone(),
        }
    }

    /// Upload an object, returning its URL
    pub async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let url = format!("{}/{}/{key}", self.base_url, self.bucket);

        tracing::debug!(key, bytes = bytes.len(), "uploading object");

        let mut builder = self
            .client
            .put(&url)
            .header(http::header::CONTENT_TYPE, content_type)
            .body(bytes);

        if let Some(ref token) = self.auth_token {
            builder = builder.bearer_auth(token.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SpeechError::Storage(format!("upload request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("storage upload failed ({status}): {error_text}");
            return Err(SpeechError::Storage(format!("{status}: {error_text}")));
        }

        Ok(url)
    }
}
