#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod health;

use std::net::SocketAddr;

use axum::Router;
use murmur_config::Config;
use tower_http::trace::TraceLayer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
    shutdown_tasks: tokio_util::sync::CancellationToken,
}

impl Server {
    /// Build the server from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if speech pipeline initialization fails
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let speech_state = murmur_speech::build_server(config)?;

        // The sweeper outlives any single request; it stops with the server
        let shutdown_tasks = tokio_util::sync::CancellationToken::new();
        murmur_speech::spawn_sweeper(&speech_state, shutdown_tasks.clone());

        let mut app = Router::new();

        // Health check
        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health::health_handler));
        }

        // Speech routes
        app = app.merge(murmur_speech::endpoint_router().with_state(speech_state));

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        Ok(Self {
            router: app,
            listen_address,
            shutdown_tasks,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener. Background
    /// tasks keep running until the returned token is cancelled.
    pub fn into_router(self) -> (Router, tokio_util::sync::CancellationToken) {
        (self.router, self.shutdown_tasks)
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        let tasks = self.shutdown_tasks;

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tasks.cancel();
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}
