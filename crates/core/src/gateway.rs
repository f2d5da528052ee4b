//! Seams to the remote profile service and to photo source URLs.
//!
//! [`ProfileGateway`] is implemented over HTTP by the `bizprofile-graph`
//! crate; tests substitute in-memory doubles. Implementations hold no
//! per-request state.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::media::MediaType;
use crate::types::Credentials;

/// Status code and parsed body of a remote response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: Value,
}

/// Raw result of a profile read, before normalization.
pub type RawProfileResponse = RemoteResponse;

/// Acknowledgement of a remote write.
pub type RemoteAck = RemoteResponse;

/// Bytes and declared content type fetched from a photo source URL.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Errors from a remote call.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The remote service answered with a non-2xx status.
    #[error("Remote service error ({status}): {body}")]
    Remote {
        status: u16,
        /// Parsed JSON body, or the raw text as a JSON string if unparsable.
        body: Value,
    },

    /// A 2xx response lacked a field the protocol requires.
    #[error("Remote protocol error: {0}")]
    Protocol(String),

    /// The request never produced a response (network, DNS, TLS, timeout).
    #[error("Remote request failed: {0}")]
    Transport(String),

    /// A downloaded body exceeded the caller's byte limit. `received` is the
    /// declared length or the bytes read before giving up.
    #[error("Response body of at least {received} bytes exceeds the {limit} byte limit")]
    BodyTooLarge { received: usize, limit: usize },
}

impl GatewayError {
    /// Remote HTTP status, when the service answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Remote response body, when the service answered.
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Remote { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Message the remote service attached to its error, if any.
    ///
    /// Looks at `error.message`, then `error` as a string, then `message`.
    pub fn remote_message(&self) -> Option<&str> {
        let body = self.body()?;
        body.get("error")
            .and_then(|err| err.get("message"))
            .and_then(Value::as_str)
            .or_else(|| body.get("error").and_then(Value::as_str))
            .or_else(|| body.get("message").and_then(Value::as_str))
            .filter(|msg| !msg.trim().is_empty())
    }
}

/// Typed client for the remote business-profile service.
#[async_trait]
pub trait ProfileGateway: Send + Sync {
    /// Read the profile of `entity_id`.
    async fn get_profile(
        &self,
        entity_id: &str,
        credentials: &Credentials,
    ) -> Result<RawProfileResponse, GatewayError>;

    /// Write the fields in `envelope` to the profile of `entity_id`.
    async fn apply_fields(
        &self,
        entity_id: &str,
        credentials: &Credentials,
        envelope: &Value,
    ) -> Result<RemoteAck, GatewayError>;

    /// Open an upload session and return its identifier verbatim.
    async fn create_upload_session(
        &self,
        app_id: &str,
        credentials: &Credentials,
        byte_length: usize,
        media_type: MediaType,
    ) -> Result<String, GatewayError>;

    /// Send the full payload to `session_id` at offset 0.
    ///
    /// `session_id` must be forwarded without re-encoding.
    async fn upload_bytes(
        &self,
        session_id: &str,
        credentials: &Credentials,
        bytes: Vec<u8>,
    ) -> Result<RemoteResponse, GatewayError>;

    /// Set the profile picture of `entity_id` from an uploaded media handle.
    async fn apply_handle(
        &self,
        entity_id: &str,
        credentials: &Credentials,
        handle: &str,
    ) -> Result<RemoteAck, GatewayError>;
}

/// Downloads photo sources given by URL.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Download `url`, failing with [`GatewayError::BodyTooLarge`] as soon
    /// as the body is known to exceed `max_bytes`.
    async fn fetch(&self, url: &str, max_bytes: usize) -> Result<FetchedMedia, GatewayError>;
}
