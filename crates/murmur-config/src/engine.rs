use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Inference engine configuration
///
/// The engine is an external pretrained model runtime; Murmur only talks to
/// it, either over HTTP (`sidecar`) or by spawning a local CLI (`command`).
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineConfig {
    /// HTTP inference server
    Sidecar(SidecarEngineConfig),
    /// Local inference CLI spawned per request
    Command(CommandEngineConfig),
}

/// Configuration for an HTTP inference sidecar
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SidecarEngineConfig {
    /// Base URL of the inference server
    pub base_url: Url,
    /// Optional API key sent as a bearer token
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Configuration for a local inference command
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandEngineConfig {
    /// Path to the inference program
    pub program: String,
    /// Arguments prepended before the per-request flags
    #[serde(default)]
    pub args: Vec<String>,
    /// Wall-clock timeout for one inference run, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    120
}
