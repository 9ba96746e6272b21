use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use murmur_engine::EngineError;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpeechError>;

/// Speech service errors with appropriate HTTP status codes
#[derive(Debug, Error)]
pub enum SpeechError {
    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown job or file id
    #[error("{0} not found")]
    NotFound(String),

    /// Reference audio exceeds the configured limit
    #[error("Reference audio exceeds the {limit_bytes} byte limit")]
    ReferenceTooLarge { limit_bytes: usize },

    /// Fetching the remote reference audio failed
    #[error("Failed to fetch reference audio: {0}")]
    ReferenceFetch(String),

    /// Too many jobs queued or running
    #[error("Job queue is full")]
    TooManyJobs,

    /// The inference engine failed
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Object storage upload failed
    #[error("Storage upload failed: {0}")]
    Storage(String),

    /// Internal server error
    /// If Some(message), it is safe to show; if None, details are suppressed
    #[error("Internal server error")]
    InternalError(Option<String>),
}

impl SpeechError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ReferenceTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::TooManyJobs => StatusCode::TOO_MANY_REQUESTS,
            Self::ReferenceFetch(_) | Self::Storage(_) => StatusCode::BAD_GATEWAY,
            Self::Engine(engine) => match engine {
                EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                EngineError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                EngineError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string for the response
    pub fn error_type(&self) -> &str {
        match self {
            Self::InvalidRequest(_) | Self::ReferenceTooLarge { .. } => "invalid_request_error",
            Self::NotFound(_) => "not_found_error",
            Self::TooManyJobs => "rate_limit_error",
            Self::ReferenceFetch(_) | Self::Storage(_) | Self::Engine(_) => "engine_error",
            Self::InternalError(_) => "internal_error",
        }
    }

    /// Message that is safe to expose to API consumers
    pub fn client_message(&self) -> String {
        match self {
            Self::InternalError(Some(message)) => message.clone(),
            Self::InternalError(None) | Self::Engine(EngineError::InternalError(None)) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error response format compatible with `OpenAI` API
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    message: String,
    r#type: String,
    code: u16,
}

impl IntoResponse for SpeechError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.client_message();

        let error_response = ErrorResponse {
            error: ErrorDetails {
                message,
                r#type: self.error_type().to_string(),
                code: status.as_u16(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}
