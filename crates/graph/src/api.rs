//! REST client for the Graph business-profile and resumable-upload endpoints.
//!
//! Entity and app ids are inserted as percent-encoded path segments. Upload
//! session ids are appended to the URL verbatim: the remote service issues
//! them with embedded `:`/`?`/`=` delimiters and a signature parameter that
//! must reach it unchanged.

use std::time::Duration;

use async_trait::async_trait;
use bizprofile_core::coordinator::MESSAGING_PRODUCT;
use bizprofile_core::gateway::{
    GatewayError, ProfileGateway, RawProfileResponse, RemoteAck, RemoteResponse,
};
use bizprofile_core::media::MediaType;
use bizprofile_core::profile::PROFILE_READ_FIELDS;
use bizprofile_core::types::Credentials;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use serde_json::Value;

use crate::body::{read_response, transport_error};

/// Default Graph API host.
pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com";

/// Default Graph API version.
pub const DEFAULT_API_VERSION: &str = "v21.0";

/// Default timeout for a single outbound call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Path suffix of the business-profile edge.
const PROFILE_EDGE: &str = "whatsapp_business_profile";

/// Connection settings for [`GraphApi`].
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub base_url: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Errors building a Graph client.
#[derive(Debug, thiserror::Error)]
pub enum GraphSetupError {
    #[error("Invalid Graph base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// HTTP client for the Graph business-profile API.
pub struct GraphApi {
    client: reqwest::Client,
    base_url: Url,
    api_version: String,
}

impl GraphApi {
    /// Build a client with its own connection pool and request timeout.
    pub fn new(config: &GraphConfig) -> Result<Self, GraphSetupError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Self::with_client(client, &config.base_url, &config.api_version)
    }

    /// Build a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        api_version: &str,
    ) -> Result<Self, GraphSetupError> {
        let base_url = Url::parse(base_url).map_err(|e| GraphSetupError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GraphSetupError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "URL cannot be a base".to_string(),
            });
        }

        Ok(Self {
            client,
            base_url,
            api_version: api_version.trim_matches('/').to_string(),
        })
    }

    /// `{base}/{version}/{entity_id}/whatsapp_business_profile`, entity id encoded.
    pub fn profile_url(&self, entity_id: &str) -> Url {
        self.versioned_url(&[entity_id, PROFILE_EDGE])
    }

    /// `{base}/{version}/{app_id}/uploads?file_length=..&file_type=..`, app id encoded.
    pub fn uploads_url(&self, app_id: &str, byte_length: usize, media_type: MediaType) -> Url {
        let mut url = self.versioned_url(&[app_id, "uploads"]);
        url.query_pairs_mut()
            .append_pair("file_length", &byte_length.to_string())
            .append_pair("file_type", media_type.as_mime());
        url
    }

    /// `{base}/{version}/{session_id}` with the session id appended as-is.
    pub fn session_url(&self, session_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.api_version,
            session_id
        )
    }

    fn versioned_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `cannot_be_a_base` was rejected in `with_client`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(&self.api_version).extend(segments);
        }
        url
    }

    async fn post_profile(
        &self,
        entity_id: &str,
        credentials: &Credentials,
        envelope: &Value,
    ) -> Result<RemoteAck, GatewayError> {
        tracing::debug!(entity_id, "POST profile fields");

        let response = self
            .client
            .post(self.profile_url(entity_id))
            .bearer_auth(credentials.access_token())
            .json(envelope)
            .send()
            .await
            .map_err(transport_error)?;

        read_response(response).await
    }
}

#[async_trait]
impl ProfileGateway for GraphApi {
    async fn get_profile(
        &self,
        entity_id: &str,
        credentials: &Credentials,
    ) -> Result<RawProfileResponse, GatewayError> {
        tracing::debug!(entity_id, "GET profile");

        let mut url = self.profile_url(entity_id);
        url.query_pairs_mut()
            .append_pair("fields", PROFILE_READ_FIELDS);

        let response = self
            .client
            .get(url)
            .bearer_auth(credentials.access_token())
            .send()
            .await
            .map_err(transport_error)?;

        read_response(response).await
    }

    async fn apply_fields(
        &self,
        entity_id: &str,
        credentials: &Credentials,
        envelope: &Value,
    ) -> Result<RemoteAck, GatewayError> {
        self.post_profile(entity_id, credentials, envelope).await
    }

    async fn create_upload_session(
        &self,
        app_id: &str,
        credentials: &Credentials,
        byte_length: usize,
        media_type: MediaType,
    ) -> Result<String, GatewayError> {
        tracing::debug!(app_id, byte_length, %media_type, "POST upload session");

        let response = self
            .client
            .post(self.uploads_url(app_id, byte_length, media_type))
            .bearer_auth(credentials.access_token())
            .send()
            .await
            .map_err(transport_error)?;

        let created = read_response(response).await?;
        session_id_from(&created.body).ok_or_else(|| {
            GatewayError::Protocol("upload session response did not contain an id".to_string())
        })
    }

    async fn upload_bytes(
        &self,
        session_id: &str,
        credentials: &Credentials,
        bytes: Vec<u8>,
    ) -> Result<RemoteResponse, GatewayError> {
        tracing::debug!(byte_length = bytes.len(), "POST upload bytes");

        let response = self
            .client
            .post(self.session_url(session_id))
            .header(AUTHORIZATION, format!("OAuth {}", credentials.access_token()))
            .header("file_offset", "0")
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(transport_error)?;

        read_response(response).await
    }

    async fn apply_handle(
        &self,
        entity_id: &str,
        credentials: &Credentials,
        handle: &str,
    ) -> Result<RemoteAck, GatewayError> {
        let envelope = serde_json::json!({
            "messaging_product": MESSAGING_PRODUCT,
            "profile_picture_handle": handle,
        });
        self.post_profile(entity_id, credentials, &envelope).await
    }
}

/// Session id from an upload-session response (`{"id": "..."}`).
fn session_id_from(body: &Value) -> Option<String> {
    body.get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn api() -> GraphApi {
        GraphApi::with_client(reqwest::Client::new(), "https://graph.example.com", "v21.0")
            .unwrap()
    }

    #[test]
    fn profile_url_percent_encodes_entity_id() {
        let url = api().profile_url("10 9/8?x");
        assert_eq!(
            url.as_str(),
            "https://graph.example.com/v21.0/10%209%2F8%3Fx/whatsapp_business_profile"
        );
    }

    #[test]
    fn profile_url_plain_entity_id() {
        assert_eq!(
            api().profile_url("1234567890").as_str(),
            "https://graph.example.com/v21.0/1234567890/whatsapp_business_profile"
        );
    }

    #[test]
    fn uploads_url_carries_length_and_type() {
        let url = api().uploads_url("app/1", 2048, MediaType::Jpeg);
        assert_eq!(url.path(), "/v21.0/app%2F1/uploads");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("file_length".to_string(), "2048".to_string()),
                ("file_type".to_string(), "image/jpeg".to_string()),
            ]
        );
    }

    #[test]
    fn session_url_does_not_reencode_session_id() {
        let session_id = "upload:MTphdHRhY2htZW50OjE=?sig=ARZa%2Fb+c&x=1";
        assert_eq!(
            api().session_url(session_id),
            format!("https://graph.example.com/v21.0/{session_id}")
        );
    }

    #[test]
    fn built_upload_request_keeps_session_id_verbatim() {
        let api = api();
        let session_id = "upload:MTphdHRhY2htZW50OjE=?sig=ARZa%2Fb&x=1";
        let request = api
            .client
            .post(api.session_url(session_id))
            .header("file_offset", "0")
            .body(vec![1u8, 2, 3])
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://graph.example.com/v21.0/upload:MTphdHRhY2htZW50OjE=?sig=ARZa%2Fb&x=1"
        );
        assert_eq!(request.url().path(), "/v21.0/upload:MTphdHRhY2htZW50OjE=");
        assert_eq!(request.url().query(), Some("sig=ARZa%2Fb&x=1"));
    }

    #[test]
    fn base_url_with_path_keeps_prefix() {
        let api = GraphApi::with_client(reqwest::Client::new(), "http://localhost:9000/graph/", "/v1.0/")
            .unwrap();
        assert_eq!(
            api.profile_url("42").as_str(),
            "http://localhost:9000/graph/v1.0/42/whatsapp_business_profile"
        );
        assert_eq!(api.session_url("upload:abc"), "http://localhost:9000/graph/v1.0/upload:abc");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(GraphApi::with_client(reqwest::Client::new(), "not a url", "v1").is_err());
        assert!(GraphApi::with_client(reqwest::Client::new(), "mailto:a@b.c", "v1").is_err());
    }

    #[test]
    fn session_id_requires_non_empty_string() {
        assert_eq!(session_id_from(&json!({ "id": "upload:1" })).as_deref(), Some("upload:1"));
        assert_eq!(session_id_from(&json!({ "id": "" })), None);
        assert_eq!(session_id_from(&json!({ "id": 5 })), None);
        assert_eq!(session_id_from(&json!({})), None);
    }

    #[test]
    fn default_config_targets_graph() {
        let config = GraphConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert!(GraphApi::new(&config).is_ok());
    }
}
