//! Profile photo upload state machine.
//!
//! A photo is applied in three strictly sequential remote calls:
//!
//! ```text
//! Idle --create session--> SessionCreated --upload bytes--> BytesUploaded --apply handle--> Applied
//! ```
//!
//! Any failure is terminal and tagged with the phase the orchestrator was in
//! when it occurred. Nothing is retried and an abandoned remote session is
//! not cleaned up.

use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::gateway::{GatewayError, ProfileGateway, RemoteAck, SourceFetcher};
use crate::handle::extract_handle;
use crate::media::{MediaType, DEFAULT_MAX_PHOTO_BYTES};
use crate::types::Credentials;

// ---------------------------------------------------------------------------
// Phases and session
// ---------------------------------------------------------------------------

/// Position of an upload in the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Idle,
    SessionCreated,
    BytesUploaded,
    Applied,
}

impl UploadPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SessionCreated => "session_created",
            Self::BytesUploaded => "bytes_uploaded",
            Self::Applied => "applied",
        }
    }
}

impl std::fmt::Display for UploadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote upload session, scoped to one orchestration run.
#[derive(Debug, Clone)]
pub struct UploadSession {
    /// Session token exactly as issued by the remote service.
    pub id: String,
    pub byte_length: usize,
    pub media_type: MediaType,
    phase: UploadPhase,
}

impl UploadSession {
    fn created(id: String, byte_length: usize, media_type: MediaType) -> Self {
        tracing::info!(
            session_id = %id,
            from = %UploadPhase::Idle,
            to = %UploadPhase::SessionCreated,
            "Upload phase transition"
        );
        Self {
            id,
            byte_length,
            media_type,
            phase: UploadPhase::SessionCreated,
        }
    }

    fn advance(&mut self, next: UploadPhase) {
        tracing::info!(
            session_id = %self.id,
            from = %self.phase,
            to = %next,
            "Upload phase transition"
        );
        self.phase = next;
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Where the photo bytes come from.
#[derive(Debug, Clone)]
pub enum PhotoSource {
    /// Raw bytes with the caller-declared content type, if any.
    Bytes {
        data: Vec<u8>,
        declared_mime: Option<String>,
    },
    /// A remote `https` URL to download.
    Url(String),
}

/// Photo bytes whose media type has been resolved against the allow-list.
#[derive(Debug, Clone)]
pub struct PhotoPayload {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
}

/// Successful result of [`UploadOrchestrator::run`].
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub upload_id: String,
    pub handle: String,
    pub apply: RemoteAck,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Broad class of an upload failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Rejected before any remote call.
    Validation,
    /// The remote service (or photo source) answered with a failure.
    Remote,
    /// A successful response was missing an expected field.
    Protocol,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Missing app identifier for uploads")]
    MissingAppId,

    #[error("Unsupported media type '{0}', expected image/jpeg or image/png")]
    UnsupportedMediaType(String),

    #[error("Invalid photo source URL: {0}")]
    InvalidSourceUrl(String),

    #[error("Photo payload is empty")]
    EmptyPayload,

    #[error("Photo payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Failed to fetch photo source: {0}")]
    SourceFetch(GatewayError),

    #[error("Failed to create upload session: {0}")]
    SessionCreate(GatewayError),

    #[error("Failed to upload photo bytes: {0}")]
    ByteUpload(GatewayError),

    #[error("Upload response did not contain a media handle")]
    MissingHandle,

    #[error("Failed to apply photo to profile: {0}")]
    Apply(GatewayError),
}

impl UploadError {
    /// Phase the state machine was in when the failure occurred.
    pub fn phase(&self) -> UploadPhase {
        match self {
            Self::MissingAppId
            | Self::UnsupportedMediaType(_)
            | Self::InvalidSourceUrl(_)
            | Self::EmptyPayload
            | Self::PayloadTooLarge { .. }
            | Self::SourceFetch(_)
            | Self::SessionCreate(_) => UploadPhase::Idle,
            Self::ByteUpload(_) => UploadPhase::SessionCreated,
            Self::MissingHandle | Self::Apply(_) => UploadPhase::BytesUploaded,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingAppId
            | Self::UnsupportedMediaType(_)
            | Self::InvalidSourceUrl(_)
            | Self::EmptyPayload
            | Self::PayloadTooLarge { .. } => FailureKind::Validation,
            Self::MissingHandle => FailureKind::Protocol,
            Self::SourceFetch(err)
            | Self::SessionCreate(err)
            | Self::ByteUpload(err)
            | Self::Apply(err) => match err {
                GatewayError::Protocol(_) => FailureKind::Protocol,
                _ => FailureKind::Remote,
            },
        }
    }

    /// Underlying remote failure, if any.
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            Self::SourceFetch(err)
            | Self::SessionCreate(err)
            | Self::ByteUpload(err)
            | Self::Apply(err) => Some(err),
            _ => None,
        }
    }

    /// Generic message naming the step that failed, for when the remote
    /// service gave no message of its own.
    pub fn phase_label(&self) -> &'static str {
        match self {
            Self::SourceFetch(_) => "Upload failed while fetching the photo source",
            Self::SessionCreate(_) => "Upload failed while creating upload session",
            Self::ByteUpload(_) => "Upload failed while sending photo bytes",
            Self::MissingHandle => "Upload failed: no media handle returned",
            Self::Apply(_) => "Upload failed while applying photo to profile",
            _ => "Upload rejected",
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives one photo through acquisition and the three remote phases.
///
/// Holds only shared, stateless clients; every run owns its own
/// [`UploadSession`].
#[derive(Clone)]
pub struct UploadOrchestrator {
    gateway: Arc<dyn ProfileGateway>,
    fetcher: Arc<dyn SourceFetcher>,
    max_bytes: usize,
}

impl UploadOrchestrator {
    pub fn new(gateway: Arc<dyn ProfileGateway>, fetcher: Arc<dyn SourceFetcher>) -> Self {
        Self {
            gateway,
            fetcher,
            max_bytes: DEFAULT_MAX_PHOTO_BYTES,
        }
    }

    /// Override the payload size limit.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Resolve `source` into allow-listed bytes.
    ///
    /// URLs must be `https` and are downloaded with the source fetcher.
    /// No upload session is created here.
    pub async fn acquire(&self, source: PhotoSource) -> Result<PhotoPayload, UploadError> {
        let (bytes, media_type) = match source {
            PhotoSource::Bytes {
                data,
                declared_mime,
            } => {
                let media_type = resolve_media_type(declared_mime.as_deref(), &data)?;
                (data, media_type)
            }
            PhotoSource::Url(raw) => {
                let url = validate_source_url(&raw)?;
                tracing::info!(url = %url, "Fetching photo source");
                let fetched = self
                    .fetcher
                    .fetch(url.as_str(), self.max_bytes)
                    .await
                    .map_err(|err| match err {
                        GatewayError::BodyTooLarge { received, limit } => {
                            UploadError::PayloadTooLarge {
                                size: received,
                                limit,
                            }
                        }
                        other => UploadError::SourceFetch(other),
                    })?;
                let content_type = fetched.content_type.unwrap_or_default();
                let media_type = MediaType::from_mime(&content_type)
                    .ok_or(UploadError::UnsupportedMediaType(content_type))?;
                (fetched.bytes, media_type)
            }
        };

        if bytes.is_empty() {
            return Err(UploadError::EmptyPayload);
        }
        if bytes.len() > self.max_bytes {
            return Err(UploadError::PayloadTooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        Ok(PhotoPayload { bytes, media_type })
    }

    /// Acquire `source` and apply it as the profile photo of `entity_id`.
    ///
    /// Makes at most one call per phase, each only after the previous one
    /// succeeded.
    pub async fn run(
        &self,
        entity_id: &str,
        app_id: &str,
        credentials: &Credentials,
        source: PhotoSource,
    ) -> Result<UploadOutcome, UploadError> {
        if app_id.trim().is_empty() {
            return Err(UploadError::MissingAppId);
        }

        let payload = self.acquire(source).await?;
        let result = self.drive(entity_id, app_id, credentials, payload).await;
        if let Err(err) = &result {
            tracing::warn!(
                entity_id,
                phase = %err.phase(),
                error = %err,
                "Photo upload failed"
            );
        }
        result
    }

    async fn drive(
        &self,
        entity_id: &str,
        app_id: &str,
        credentials: &Credentials,
        payload: PhotoPayload,
    ) -> Result<UploadOutcome, UploadError> {
        let byte_length = payload.bytes.len();
        tracing::info!(
            entity_id,
            byte_length,
            media_type = %payload.media_type,
            "Creating upload session"
        );

        let session_id = self
            .gateway
            .create_upload_session(app_id, credentials, byte_length, payload.media_type)
            .await
            .map_err(UploadError::SessionCreate)?;
        let mut session = UploadSession::created(session_id, byte_length, payload.media_type);

        let upload = self
            .gateway
            .upload_bytes(&session.id, credentials, payload.bytes)
            .await
            .map_err(UploadError::ByteUpload)?;
        let handle = extract_handle(&upload.body).ok_or(UploadError::MissingHandle)?;
        session.advance(UploadPhase::BytesUploaded);

        let apply = self
            .gateway
            .apply_handle(entity_id, credentials, &handle)
            .await
            .map_err(UploadError::Apply)?;
        session.advance(UploadPhase::Applied);

        Ok(UploadOutcome {
            upload_id: session.id,
            handle,
            apply,
        })
    }
}

/// Pick the media type of a raw payload.
///
/// A declared type must be on the allow-list. An absent or generic
/// (`application/octet-stream`) declaration falls back to sniffing.
fn resolve_media_type(declared: Option<&str>, bytes: &[u8]) -> Result<MediaType, UploadError> {
    match declared.map(str::trim).filter(|m| !m.is_empty()) {
        Some(mime) if !mime.eq_ignore_ascii_case("application/octet-stream") => {
            MediaType::from_mime(mime).ok_or_else(|| UploadError::UnsupportedMediaType(mime.to_string()))
        }
        _ => MediaType::sniff(bytes)
            .ok_or_else(|| UploadError::UnsupportedMediaType("unrecognized image data".to_string())),
    }
}

/// Parse `raw` and require an `https` URL with a non-empty host.
///
/// Backslashes are rejected outright: RFC 3986 does not allow them and
/// WHATWG parsing silently rewrites them into path separators.
fn validate_source_url(raw: &str) -> Result<Url, UploadError> {
    let raw = raw.trim();
    if raw.contains('\\') {
        return Err(UploadError::InvalidSourceUrl(format!(
            "'{raw}' contains a backslash"
        )));
    }
    let url = Url::parse(raw)
        .map_err(|e| UploadError::InvalidSourceUrl(format!("'{raw}' is not a valid URL: {e}")))?;
    if url.scheme() != "https" {
        return Err(UploadError::InvalidSourceUrl(format!("'{raw}' must use https")));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UploadError::InvalidSourceUrl(format!("'{raw}' has no host")));
    }
    Ok(url)
}
