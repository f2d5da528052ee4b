//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no router or
//! remote double is involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use bizprofile_api::error::AppError;
use bizprofile_core::coordinator::UpdateError;
use bizprofile_core::error::CoreError;
use bizprofile_core::gateway::GatewayError;
use bizprofile_core::upload::UploadError;
use http_body_util::BodyExt;
use serde_json::json;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: CoreError::Validation maps to 400 with VALIDATION_ERROR code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("about is too long".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "about is too long");
}

// ---------------------------------------------------------------------------
// Test: AppError::BadRequest maps to 400 with BAD_REQUEST code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("invalid field value".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "invalid field value");
}

// ---------------------------------------------------------------------------
// Test: empty changeset maps to 400 with EMPTY_CHANGESET code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_changeset_returns_400() {
    let (status, json) = error_to_response(UpdateError::EmptyChangeSet.into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "EMPTY_CHANGESET");
}

// ---------------------------------------------------------------------------
// Test: remote failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn remote_error_with_success_status_becomes_502() {
    let err = AppError::Gateway(GatewayError::Remote {
        status: 200,
        body: json!({ "error": { "message": "odd" } }),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "REMOTE_ERROR");
    assert_eq!(json["error"], "odd");
    assert_eq!(json["status"], 200);
}

#[tokio::test]
async fn transport_error_returns_502_unavailable() {
    let err = AppError::Gateway(GatewayError::Transport("connection refused".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "REMOTE_UNAVAILABLE");
    assert_eq!(json["error"], "Remote request failed");
    assert_eq!(json["detail"], "connection refused");
}

#[tokio::test]
async fn protocol_error_returns_502() {
    let err = AppError::Gateway(GatewayError::Protocol("session id missing".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "PROTOCOL_ERROR");
}

// ---------------------------------------------------------------------------
// Test: upload errors carry the phase they failed in
// ---------------------------------------------------------------------------

#[tokio::test]
async fn upload_transport_failure_carries_phase() {
    let err: AppError = UploadError::ByteUpload(GatewayError::Transport("reset".into())).into();

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "REMOTE_UNAVAILABLE");
    assert_eq!(json["phase"], "session_created");
    assert_eq!(json["error"], "Upload failed while sending photo bytes");
}

#[tokio::test]
async fn session_protocol_failure_carries_phase() {
    let err: AppError =
        UploadError::SessionCreate(GatewayError::Protocol("no session id".into())).into();

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "PROTOCOL_ERROR");
    assert_eq!(json["phase"], "idle");
    assert_eq!(json["detail"], "no session id");
}

#[tokio::test]
async fn missing_handle_is_protocol_error() {
    let (status, json) = error_to_response(UploadError::MissingHandle.into()).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "PROTOCOL_ERROR");
    assert_eq!(json["phase"], "bytes_uploaded");
}

#[tokio::test]
async fn unsupported_media_type_returns_415() {
    let err: AppError = UploadError::UnsupportedMediaType("image/gif".into()).into();

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(json["code"], "UNSUPPORTED_MEDIA_TYPE");
}

#[tokio::test]
async fn oversized_download_returns_413() {
    let err = AppError::Gateway(GatewayError::BodyTooLarge {
        received: 4096,
        limit: 1024,
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(json["limit"], 1024);
}

#[tokio::test]
async fn payload_too_large_returns_413() {
    let err: AppError = UploadError::PayloadTooLarge {
        size: 10,
        limit: 5,
    }
    .into();

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["code"], "PAYLOAD_TOO_LARGE");
}

#[tokio::test]
async fn missing_app_id_returns_400() {
    let (status, json) = error_to_response(UploadError::MissingAppId.into()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
}
