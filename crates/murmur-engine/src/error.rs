use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Inference engine failures
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine rejected the request as malformed
    #[error("Engine rejected request: {0}")]
    InvalidRequest(String),

    /// The engine rejected our credentials
    #[error("Engine authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The engine answered with an error status
    #[error("Engine API error ({status}): {message}")]
    EngineApiError { status: u16, message: String },

    /// The engine could not be reached
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The inference run exceeded the configured timeout
    #[error("Inference timed out after {0}s")]
    Timeout(u64),

    /// The engine produced audio Murmur cannot decode
    #[error("Unusable engine output: {0}")]
    BadAudio(String),

    /// Internal error
    /// If Some(message), it came from the engine and can be shown
    /// If None, details should not leak to API consumers
    #[error("Internal engine error")]
    InternalError(Option<String>),
}
