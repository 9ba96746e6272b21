#![allow(clippy::must_use_candidate)]

pub mod engine;
mod env;
mod loader;
pub mod log;
pub mod server;
pub mod speech;

use serde::Deserialize;

pub use engine::*;
pub use log::*;
pub use server::*;
pub use speech::*;

/// Top-level Murmur configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Inference engine configuration
    pub engine: EngineConfig,
    /// Speech pipeline configuration
    #[serde(default)]
    pub speech: SpeechConfig,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}
