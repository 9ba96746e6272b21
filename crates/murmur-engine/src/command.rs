use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use murmur_config::CommandEngineConfig;

use crate::{Engine, EngineMetadata, Synthesis, SynthesisRequest, error::EngineError, wav};

/// Local inference CLI spawned per request
///
/// The program receives the reference path and an output path and is expected
/// to write a mono WAV file. Useful for path-based inference runtimes that
/// do not expose an HTTP server.
pub struct CommandEngine {
    program: String,
    base_args: Vec<String>,
    timeout: Duration,
}

impl CommandEngine {
    pub fn new(config: &CommandEngineConfig) -> Self {
        Self {
            program: config.program.clone(),
            base_args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl Engine for CommandEngine {
    async fn synthesize(&self, request: &SynthesisRequest) -> crate::Result<Synthesis> {
        let output_file = tempfile::Builder::new()
            .prefix("murmur-out-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| EngineError::InternalError(Some(format!("failed to create output file: {e}"))))?;

        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(&self.base_args)
            .arg("--ref-audio")
            .arg(&request.reference_path)
            .arg("--gen-text")
            .arg(&request.input)
            .arg("--speed")
            .arg(request.speed.to_string())
            .arg("--cross-fade-duration")
            .arg(request.cross_fade_duration.to_string())
            .arg("--output")
            .arg(output_file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref text) = request.reference_text {
            command.arg("--ref-text").arg(text);
        }

        tracing::debug!("spawning inference command: {}", self.program);

        let started = Instant::now();

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| EngineError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| EngineError::ConnectionError(format!("Failed to spawn '{}': {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(
                "inference command failed ({}): {}",
                output.status,
                stderr.trim(),
            );
            return Err(EngineError::EngineApiError {
                status: 500,
                message: stderr.trim().to_string(),
            });
        }

        let bytes = tokio::fs::read(output_file.path())
            .await
            .map_err(|e| EngineError::BadAudio(format!("failed to read command output: {e}")))?;

        let (samples, sample_rate) = wav::decode(&bytes)?;

        if samples.is_empty() {
            return Err(EngineError::BadAudio("command produced an empty waveform".to_string()));
        }

        tracing::debug!(
            "command synthesis complete: {} samples at {sample_rate} Hz",
            samples.len(),
        );

        Ok(Synthesis {
            samples,
            sample_rate,
            metadata: EngineMetadata {
                inference: started.elapsed(),
                reference_transcript: None,
            },
        })
    }

    fn name(&self) -> &str {
        "command"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(program: &str, timeout_secs: u64) -> CommandEngine {
        CommandEngine::new(&CommandEngineConfig {
            program: program.to_string(),
            args: Vec::new(),
            timeout_secs,
        })
    }

    fn request() -> SynthesisRequest {
        SynthesisRequest {
            reference_path: std::env::temp_dir().join("missing.wav"),
            reference_text: None,
            input: "hello".to_string(),
            speed: 1.0,
            cross_fade_duration: 0.15,
        }
    }

    #[tokio::test]
    async fn missing_program_is_a_connection_error() {
        let result = engine("/nonexistent/murmur-infer", 5).synthesize(&request()).await;
        assert!(matches!(result, Err(EngineError::ConnectionError(_))));
    }

    #[tokio::test]
    async fn failing_program_surfaces_stderr() {
        // `false` exits nonzero without writing output
        let result = engine("false", 5).synthesize(&request()).await;
        assert!(matches!(result, Err(EngineError::EngineApiError { status: 500, .. })));
    }
}
