use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bizprofile_core::coordinator::UpdateError;
use bizprofile_core::error::CoreError;
use bizprofile_core::gateway::GatewayError;
use bizprofile_core::upload::{FailureKind, UploadError, UploadPhase};
use serde_json::{json, Value};

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain errors from `bizprofile_core` and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses of the form `{ "error": ..., "code": ... }`. Remote failures
/// additionally carry the remote `status` and body under `remote`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `bizprofile_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failed profile update.
    #[error(transparent)]
    Update(#[from] UpdateError),

    /// A failed photo upload.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// A failed remote call outside the update and upload flows.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Update(update) => match update {
                UpdateError::EmptyChangeSet => plain(
                    StatusCode::BAD_REQUEST,
                    "EMPTY_CHANGESET",
                    update.to_string(),
                ),
                UpdateError::Invalid(core) => classify_core_error(core),
                UpdateError::Remote(err) => classify_gateway_error(err, "Profile update failed", None),
            },

            AppError::Upload(upload) => classify_upload_error(upload),

            AppError::Gateway(err) => classify_gateway_error(err, "Remote request failed", None),

            AppError::BadRequest(msg) => plain(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        (status, axum::Json(body)).into_response()
    }
}

fn plain(status: StatusCode, code: &str, message: String) -> (StatusCode, Value) {
    (status, json!({ "error": message, "code": code }))
}

fn classify_core_error(err: &CoreError) -> (StatusCode, Value) {
    match err {
        CoreError::Validation(msg) => plain(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
    }
}

fn classify_upload_error(err: &UploadError) -> (StatusCode, Value) {
    match err.kind() {
        FailureKind::Validation => {
            let (status, code) = match err {
                UploadError::UnsupportedMediaType(_) => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE")
                }
                UploadError::PayloadTooLarge { .. } => {
                    (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE")
                }
                _ => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            };
            plain(status, code, err.to_string())
        }
        FailureKind::Remote | FailureKind::Protocol => match err.gateway_error() {
            Some(inner) => classify_gateway_error(inner, err.phase_label(), Some(err.phase())),
            None => {
                tracing::warn!(phase = %err.phase(), error = %err, "Upload protocol failure");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "error": err.phase_label(),
                        "code": "PROTOCOL_ERROR",
                        "phase": err.phase(),
                    }),
                )
            }
        },
    }
}

/// Map a remote failure, reusing the remote status when it is an HTTP error
/// status and preferring the remote-provided message over `fallback`.
fn classify_gateway_error(
    err: &GatewayError,
    fallback: &str,
    phase: Option<UploadPhase>,
) -> (StatusCode, Value) {
    let (status, code, message, mut body) = match err {
        GatewayError::Remote { status, body } => {
            let http_status = StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            let message = err.remote_message().unwrap_or(fallback).to_string();
            (
                http_status,
                "REMOTE_ERROR",
                message,
                json!({ "status": status, "remote": body }),
            )
        }
        GatewayError::Protocol(detail) => (
            StatusCode::BAD_GATEWAY,
            "PROTOCOL_ERROR",
            fallback.to_string(),
            json!({ "detail": detail }),
        ),
        GatewayError::Transport(detail) => (
            StatusCode::BAD_GATEWAY,
            "REMOTE_UNAVAILABLE",
            fallback.to_string(),
            json!({ "detail": detail }),
        ),
        GatewayError::BodyTooLarge { limit, .. } => (
            StatusCode::PAYLOAD_TOO_LARGE,
            "PAYLOAD_TOO_LARGE",
            err.to_string(),
            json!({ "limit": limit }),
        ),
    };

    tracing::warn!(status = %status, code, error = %err, "Remote call failed");

    if let Value::Object(map) = &mut body {
        map.insert("error".into(), Value::String(message));
        map.insert("code".into(), Value::String(code.to_string()));
        if let Some(phase) = phase {
            map.insert("phase".into(), Value::String(phase.as_str().to_string()));
        }
    }
    (status, body)
}
