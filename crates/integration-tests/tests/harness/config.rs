//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::time::Duration;

use murmur_config::{
    Config, EngineConfig, HealthConfig, LogConfig, ServerConfig, SidecarEngineConfig, SpeechConfig, SpoolConfig,
    StorageConfig,
};
use secrecy::SecretString;

/// Builder for constructing test configurations
///
/// The spool directory is a fresh tempdir owned by the builder's output, so
/// keep the returned guard alive for the duration of the test.
pub struct ConfigBuilder {
    config: Config,
    spool_dir: tempfile::TempDir,
}

impl ConfigBuilder {
    /// Create a new builder pointed at a mock sidecar
    pub fn new(engine_base_url: &str) -> Self {
        let spool_dir = tempfile::tempdir().expect("create spool dir");

        let config = Config {
            server: ServerConfig {
                listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                health: HealthConfig::default(),
            },
            engine: EngineConfig::Sidecar(SidecarEngineConfig {
                base_url: engine_base_url.parse().expect("valid URL"),
                api_key: None,
                timeout_secs: 30,
            }),
            speech: SpeechConfig {
                spool: SpoolConfig {
                    dir: spool_dir.path().to_path_buf(),
                    ..SpoolConfig::default()
                },
                ..SpeechConfig::default()
            },
            log: LogConfig::default(),
        };

        Self { config, spool_dir }
    }

    /// Disable the health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Set the spool TTL and sweep interval
    pub fn with_spool_expiry(mut self, ttl: Duration, sweep_interval: Duration) -> Self {
        self.config.speech.spool.ttl = ttl;
        self.config.speech.spool.sweep_interval = sweep_interval;
        self
    }

    /// Set the callback secret
    pub fn with_callback_secret(mut self, secret: &str) -> Self {
        self.config.speech.jobs.callback_secret = Some(SecretString::from(secret.to_owned()));
        self
    }

    /// Limit concurrent jobs
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.config.speech.jobs.max_pending = max_pending;
        self
    }

    /// Set the terminal job record retention and sweep interval
    pub fn with_job_expiry(mut self, retention: Duration, sweep_interval: Duration) -> Self {
        self.config.speech.jobs.retention = retention;
        self.config.speech.jobs.sweep_interval = sweep_interval;
        self
    }

    /// Point storage delivery at a mock object store
    pub fn with_storage(mut self, base_url: &str, bucket: &str) -> Self {
        self.config.speech.storage = Some(StorageConfig {
            base_url: base_url.parse().expect("valid URL"),
            bucket: bucket.to_owned(),
            auth_token: None,
        });
        self
    }

    /// Cap reference audio size
    pub fn with_max_reference_bytes(mut self, bytes: usize) -> Self {
        self.config.speech.max_reference_bytes = bytes;
        self
    }

    pub fn build(self) -> (Config, tempfile::TempDir) {
        (self.config, self.spool_dir)
    }
}
