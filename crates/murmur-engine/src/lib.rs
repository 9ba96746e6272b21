#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Client side of the pretrained TTS inference engine
//!
//! The model itself (diffusion synthesis, vocoding, alignment) runs outside
//! this process. Murmur reaches it through the [`Engine`] trait, either over
//! HTTP ([`SidecarEngine`]) or by spawning a local CLI ([`CommandEngine`]).

mod command;
mod error;
mod http_client;
mod sidecar;
pub mod wav;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use murmur_config::EngineConfig;

pub use command::CommandEngine;
pub use error::{EngineError, Result};
pub use http_client::http_client;
pub use sidecar::SidecarEngine;

/// One inference call: clone the voice in the reference audio, speak `input`
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// Reference audio on the local filesystem
    pub reference_path: PathBuf,
    /// Transcript of the reference audio; engines derive one when absent
    pub reference_text: Option<String>,
    /// Text to synthesize
    pub input: String,
    /// Speech speed multiplier
    pub speed: f64,
    /// Cross-fade between generated segments, in seconds
    pub cross_fade_duration: f64,
}

/// Raw synthesis result from the engine
#[derive(Debug)]
pub struct Synthesis {
    /// Mono waveform in [-1, 1]
    pub samples: Vec<f32>,
    /// Sample rate of the waveform
    pub sample_rate: u32,
    /// Engine-internal metadata
    pub metadata: EngineMetadata,
}

/// Metadata reported alongside a synthesis
#[derive(Debug, Default)]
pub struct EngineMetadata {
    /// Wall-clock inference time
    pub inference: Duration,
    /// Transcript the engine derived for the reference audio, if any
    pub reference_transcript: Option<String>,
}

/// Trait for inference engine implementations
#[async_trait]
pub trait Engine: Send + Sync {
    /// Run one synthesis
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Synthesis>;

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Build an engine from configuration
pub fn build_engine(config: &EngineConfig) -> Result<Arc<dyn Engine>> {
    let engine: Arc<dyn Engine> = match config {
        EngineConfig::Sidecar(sidecar) => Arc::new(SidecarEngine::new(sidecar)),
        EngineConfig::Command(command) => Arc::new(CommandEngine::new(command)),
    };

    tracing::debug!("initialized inference engine: {}", engine.name());

    Ok(engine)
}
