use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Speech pipeline configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechConfig {
    /// Spool directory settings for the file delivery variant
    #[serde(default)]
    pub spool: SpoolConfig,
    /// Async job settings
    #[serde(default)]
    pub jobs: JobsConfig,
    /// Object storage for job delivery, if configured
    #[serde(default)]
    pub storage: Option<StorageConfig>,
    /// Maximum accepted reference audio size in bytes
    #[serde(default = "default_max_reference_bytes")]
    pub max_reference_bytes: usize,
    /// Timeout for fetching remote reference audio
    #[serde(
        default = "default_fetch_timeout",
        deserialize_with = "duration_str::deserialize_duration"
    )]
    pub fetch_timeout: Duration,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            spool: SpoolConfig::default(),
            jobs: JobsConfig::default(),
            storage: None,
            max_reference_bytes: default_max_reference_bytes(),
            fetch_timeout: default_fetch_timeout(),
        }
    }
}

/// Spooled audio file settings
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpoolConfig {
    /// Directory generated audio files are written to
    #[serde(default = "default_spool_dir")]
    pub dir: PathBuf,
    /// How long a generated file stays downloadable
    #[serde(default = "default_ttl", deserialize_with = "duration_str::deserialize_duration")]
    pub ttl: Duration,
    /// How often the sweeper removes expired files
    #[serde(
        default = "default_sweep_interval",
        deserialize_with = "duration_str::deserialize_duration"
    )]
    pub sweep_interval: Duration,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            dir: default_spool_dir(),
            ttl: default_ttl(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

/// Async job settings
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobsConfig {
    /// Shared secret sent on callback requests as `X-Murmur-Secret`
    #[serde(default)]
    pub callback_secret: Option<SecretString>,
    /// Maximum number of jobs that may be queued or running at once
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
    /// Timeout for delivering a completion callback
    #[serde(
        default = "default_callback_timeout",
        deserialize_with = "duration_str::deserialize_duration"
    )]
    pub callback_timeout: Duration,
    /// How long terminal job records stay pollable
    #[serde(default = "default_retention", deserialize_with = "duration_str::deserialize_duration")]
    pub retention: Duration,
    /// How often the sweeper evicts expired terminal records
    #[serde(
        default = "default_sweep_interval",
        deserialize_with = "duration_str::deserialize_duration"
    )]
    pub sweep_interval: Duration,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            callback_secret: None,
            max_pending: default_max_pending(),
            callback_timeout: default_callback_timeout(),
            retention: default_retention(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

/// Object storage endpoint for job delivery
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Base URL of the S3-compatible HTTP endpoint
    pub base_url: Url,
    /// Bucket objects are written into
    pub bucket: String,
    /// Optional bearer token
    #[serde(default)]
    pub auth_token: Option<SecretString>,
}

fn default_spool_dir() -> PathBuf {
    std::env::temp_dir().join("murmur-spool")
}

const fn default_ttl() -> Duration {
    Duration::from_secs(15 * 60)
}

const fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

const fn default_max_pending() -> usize {
    64
}

const fn default_max_reference_bytes() -> usize {
    32 << 20
}

const fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_callback_timeout() -> Duration {
    Duration::from_secs(10)
}

const fn default_retention() -> Duration {
    Duration::from_secs(60 * 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SpeechConfig::default();
        assert_eq!(config.spool.ttl, Duration::from_secs(900));
        assert_eq!(config.jobs.max_pending, 64);
        assert_eq!(config.jobs.callback_timeout, Duration::from_secs(10));
        assert_eq!(config.jobs.retention, Duration::from_secs(3600));
        assert_eq!(config.max_reference_bytes, 32 << 20);
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert!(config.storage.is_none());
    }

    #[test]
    fn durations_parse_from_strings() {
        let config: SpeechConfig = toml::from_str(
            r#"
            fetch_timeout = "5s"

            [spool]
            ttl = "5m"
            sweep_interval = "30s"

            [jobs]
            retention = "10m"
            callback_timeout = "2s"
            "#,
        )
        .unwrap();
        assert_eq!(config.spool.ttl, Duration::from_secs(300));
        assert_eq!(config.spool.sweep_interval, Duration::from_secs(30));
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.jobs.retention, Duration::from_secs(600));
        assert_eq!(config.jobs.callback_timeout, Duration::from_secs(2));
    }
}
