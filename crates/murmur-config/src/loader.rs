use std::path::Path;

use crate::{Config, EngineConfig};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded =
            crate::env::expand_env(&raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the engine or pipeline settings are unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_engine()?;
        self.validate_speech()?;
        Ok(())
    }

    fn validate_engine(&self) -> anyhow::Result<()> {
        match &self.engine {
            EngineConfig::Sidecar(sidecar) => {
                if sidecar.timeout_secs == 0 {
                    anyhow::bail!("engine.timeout_secs must be greater than 0");
                }
            }
            EngineConfig::Command(command) => {
                if command.program.is_empty() {
                    anyhow::bail!("engine.program must not be empty");
                }
                if command.timeout_secs == 0 {
                    anyhow::bail!("engine.timeout_secs must be greater than 0");
                }
            }
        }
        Ok(())
    }

    fn validate_speech(&self) -> anyhow::Result<()> {
        if self.speech.spool.ttl.is_zero() {
            anyhow::bail!("speech.spool.ttl must be greater than 0");
        }
        if self.speech.spool.sweep_interval.is_zero() {
            anyhow::bail!("speech.spool.sweep_interval must be greater than 0");
        }
        if self.speech.jobs.max_pending == 0 {
            anyhow::bail!("speech.jobs.max_pending must be greater than 0");
        }
        if self.speech.max_reference_bytes == 0 {
            anyhow::bail!("speech.max_reference_bytes must be greater than 0");
        }
        Ok(())
    }
}
