use murmur_config::{LogConfig, LogFormat};

/// Initialize the `tracing` subscriber from configuration
///
/// `RUST_LOG` overrides the configured filter when set.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_target(true))
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;
        }
        LogFormat::Pretty => {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false),
                )
                .try_init()
                .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;
        }
    }

    Ok(())
}
