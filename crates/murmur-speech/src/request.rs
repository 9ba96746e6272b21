use axum::body::Body;
use serde::de::DeserializeOwned;

use crate::types::SpeechRequest;

/// Body limit for JSON requests (24 MiB; reference audio rides inline as base64)
const JSON_BODY_LIMIT_BYTES: usize = 24 << 20;

/// Body limit for multipart uploads (32 MiB)
const MULTIPART_BODY_LIMIT_BYTES: usize = 32 << 20;

static APPLICATION_JSON: http::HeaderValue = http::HeaderValue::from_static("application/json");

/// Extractor for JSON request bodies
pub struct ExtractPayload<T>(pub T);

impl<S, T: DeserializeOwned> axum::extract::FromRequest<S> for ExtractPayload<T>
where
    S: Send + Sync,
{
    type Rejection = axum::response::Response;

    async fn from_request(request: http::Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        use axum::response::IntoResponse;

        let (parts, body) = request.into_parts();

        if parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .is_none_or(|value| value != APPLICATION_JSON)
        {
            return Err((
                axum::http::StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported Content-Type, expected: 'Content-Type: application/json'",
            )
                .into_response());
        }

        let bytes = axum::body::to_bytes(body, JSON_BODY_LIMIT_BYTES).await.map_err(|err| {
            if std::error::Error::source(&err)
                .is_some_and(|source| source.is::<http_body_util::LengthLimitError>())
            {
                (
                    axum::http::StatusCode::PAYLOAD_TOO_LARGE,
                    format!("Request body is too large, limit is {JSON_BODY_LIMIT_BYTES} bytes"),
                )
            } else {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    format!("Failed to read request body: {err}"),
                )
            }
            .into_response()
        })?;

        match serde_json::from_slice::<T>(&bytes) {
            Ok(body) => Ok(Self(body)),
            Err(e) => Err((
                axum::http::StatusCode::BAD_REQUEST,
                format!("Failed to parse request body: {e}"),
            )
                .into_response()),
        }
    }
}

/// Extractor for the multipart upload variant
///
/// Accepts a `file` part carrying the reference audio plus the text fields
/// of a [`SpeechRequest`], and produces the request with the raw bytes
/// attached separately.
pub struct ExtractSpeechForm {
    pub reference: Vec<u8>,
    pub request: SpeechRequest,
}

impl<S> axum::extract::FromRequest<S> for ExtractSpeechForm
where
    S: Send + Sync,
{
    type Rejection = axum::response::Response;

    async fn from_request(request: http::Request<Body>, _state: &S) -> Result<Self, Self::Rejection> {
        use axum::response::IntoResponse;

        let (parts, body) = request.into_parts();

        let content_type = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("multipart/form-data") {
            return Err((
                axum::http::StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Unsupported Content-Type, expected: 'Content-Type: multipart/form-data'",
            )
                .into_response());
        }

        let bytes = axum::body::to_bytes(body, MULTIPART_BODY_LIMIT_BYTES)
            .await
            .map_err(|err| {
                if std::error::Error::source(&err)
                    .is_some_and(|source| source.is::<http_body_util::LengthLimitError>())
                {
                    (
                        axum::http::StatusCode::PAYLOAD_TOO_LARGE,
                        format!("Request body is too large, limit is {MULTIPART_BODY_LIMIT_BYTES} bytes"),
                    )
                } else {
                    (
                        axum::http::StatusCode::BAD_REQUEST,
                        format!("Failed to read request body: {err}"),
                    )
                }
                .into_response()
            })?;

        // Reassemble the request for multipart parsing
        let mut rebuilt = http::Request::builder().method(parts.method.clone()).uri(parts.uri.clone());

        for (key, value) in &parts.headers {
            rebuilt = rebuilt.header(key, value);
        }

        let rebuilt = rebuilt.body(Body::from(bytes)).map_err(|e| {
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to rebuild request: {e}"),
            )
                .into_response()
        })?;

        let mut multipart = axum::extract::Multipart::from_request(rebuilt, &())
            .await
            .map_err(|e| {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    format!("Failed to parse multipart form: {e}"),
                )
                    .into_response()
            })?;

        let mut reference: Option<Vec<u8>> = None;
        let mut reference_text: Option<String> = None;
        let mut input = String::new();
        let mut speed: Option<f64> = None;
        let mut cross_fade_duration: Option<f64> = None;

        while let Ok(Some(field)) = multipart.next_field().await {
            let field_name = field.name().unwrap_or("").to_string();

            match field_name.as_str() {
                "file" => {
                    reference = Some(
                        field
                            .bytes()
                            .await
                            .map_err(|e| {
                                (
                                    axum::http::StatusCode::BAD_REQUEST,
                                    format!("Failed to read reference audio: {e}"),
                                )
                                    .into_response()
                            })?
                            .to_vec(),
                    );
                }
                "input" => {
                    input = read_text_field(field, "input").await?;
                }
                "reference_text" => {
                    reference_text = Some(read_text_field(field, "reference_text").await?);
                }
                "speed" => {
                    speed = Some(read_number_field(field, "speed").await?);
                }
                "cross_fade_duration" => {
                    cross_fade_duration = Some(read_number_field(field, "cross_fade_duration").await?);
                }
                _ => {
                    // Skip unknown fields
                }
            }
        }

        let reference = reference.ok_or_else(|| {
            (
                axum::http::StatusCode::BAD_REQUEST,
                "Missing required 'file' field in multipart form",
            )
                .into_response()
        })?;

        if input.is_empty() {
            return Err((
                axum::http::StatusCode::BAD_REQUEST,
                "Missing required 'input' field in multipart form",
            )
                .into_response());
        }

        Ok(Self {
            reference,
            request: SpeechRequest {
                reference_audio: None,
                reference_url: None,
                reference_text,
                input,
                speed,
                cross_fade_duration,
            },
        })
    }
}

async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, axum::response::Response> {
    use axum::response::IntoResponse;

    field.text().await.map_err(|e| {
        (
            axum::http::StatusCode::BAD_REQUEST,
            format!("Failed to read {name} field: {e}"),
        )
            .into_response()
    })
}

async fn read_number_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<f64, axum::response::Response> {
    use axum::response::IntoResponse;

    let text = read_text_field(field, name).await?;
    text.parse::<f64>().map_err(|e| {
        (
            axum::http::StatusCode::BAD_REQUEST,
            format!("Invalid {name} value: {e}"),
        )
            .into_response()
    })
}
