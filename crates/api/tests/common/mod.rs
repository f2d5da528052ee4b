#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use bizprofile_api::config::ServerConfig;
use bizprofile_api::router::build_app_router;
use bizprofile_api::state::AppState;
use bizprofile_core::gateway::{
    FetchedMedia, GatewayError, ProfileGateway, RawProfileResponse, RemoteAck, RemoteResponse,
    SourceFetcher,
};
use bizprofile_core::media::MediaType;
use bizprofile_core::types::Credentials;
use bizprofile_graph::GraphConfig;

pub const TOKEN: &str = "EAAB-test-token";
pub const PHONE_ID: &str = "1098765432";
pub const APP_ID: &str = "app-1";
/// Session id with reserved characters that must survive untouched.
pub const SESSION_ID: &str = "upload:MTphdHRhY2htZW50OjE=?sig=ARZa%2Fb&x=1";
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
pub const BOUNDARY: &str = "X-BIZPROFILE-BOUNDARY";

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// A remote call observed by [`FakeGateway`].
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    GetProfile { entity_id: String },
    ApplyFields { entity_id: String, envelope: Value },
    CreateSession { app_id: String, byte_length: usize, media_type: MediaType },
    UploadBytes { session_id: String, byte_length: usize },
    ApplyHandle { entity_id: String, handle: String },
}

/// Which remote call [`FakeGateway`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    GetProfile,
    ApplyFields,
    CreateSession,
    UploadBytes,
    ApplyHandle,
}

/// In-memory gateway that records every call and answers from a script.
#[derive(Default)]
pub struct FakeGateway {
    pub profile_body: Option<Value>,
    pub upload_body: Option<Value>,
    pub failure: Option<(FailAt, u16, Value)>,
    pub calls: Mutex<Vec<GatewayCall>>,
    pub tokens: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn failing(at: FailAt, status: u16, body: Value) -> Self {
        Self {
            failure: Some((at, status, body)),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: GatewayCall, credentials: &Credentials) {
        self.calls.lock().unwrap().push(call);
        self.tokens
            .lock()
            .unwrap()
            .push(credentials.access_token().to_string());
    }

    fn check(&self, at: FailAt) -> Result<(), GatewayError> {
        match &self.failure {
            Some((fail_at, status, body)) if *fail_at == at => Err(GatewayError::Remote {
                status: *status,
                body: body.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn ok(body: Value) -> RemoteResponse {
        RemoteResponse { status: 200, body }
    }
}

#[async_trait]
impl ProfileGateway for FakeGateway {
    async fn get_profile(
        &self,
        entity_id: &str,
        credentials: &Credentials,
    ) -> Result<RawProfileResponse, GatewayError> {
        self.record(
            GatewayCall::GetProfile {
                entity_id: entity_id.to_string(),
            },
            credentials,
        );
        self.check(FailAt::GetProfile)?;
        Ok(Self::ok(self.profile_body.clone().unwrap_or_else(|| {
            json!({ "data": [{ "about": "Hello", "websites": ["https://a.com"] }] })
        })))
    }

    async fn apply_fields(
        &self,
        entity_id: &str,
        credentials: &Credentials,
        envelope: &Value,
    ) -> Result<RemoteAck, GatewayError> {
        self.record(
            GatewayCall::ApplyFields {
                entity_id: entity_id.to_string(),
                envelope: envelope.clone(),
            },
            credentials,
        );
        self.check(FailAt::ApplyFields)?;
        Ok(Self::ok(json!({ "success": true })))
    }

    async fn create_upload_session(
        &self,
        app_id: &str,
        credentials: &Credentials,
        byte_length: usize,
        media_type: MediaType,
    ) -> Result<String, GatewayError> {
        self.record(
            GatewayCall::CreateSession {
                app_id: app_id.to_string(),
                byte_length,
                media_type,
            },
            credentials,
        );
        self.check(FailAt::CreateSession)?;
        Ok(SESSION_ID.to_string())
    }

    async fn upload_bytes(
        &self,
        session_id: &str,
        credentials: &Credentials,
        bytes: Vec<u8>,
    ) -> Result<RemoteResponse, GatewayError> {
        self.record(
            GatewayCall::UploadBytes {
                session_id: session_id.to_string(),
                byte_length: bytes.len(),
            },
            credentials,
        );
        self.check(FailAt::UploadBytes)?;
        Ok(Self::ok(
            self.upload_body
                .clone()
                .unwrap_or_else(|| json!({ "h": "4::aW1hZ2U=" })),
        ))
    }

    async fn apply_handle(
        &self,
        entity_id: &str,
        credentials: &Credentials,
        handle: &str,
    ) -> Result<RemoteAck, GatewayError> {
        self.record(
            GatewayCall::ApplyHandle {
                entity_id: entity_id.to_string(),
                handle: handle.to_string(),
            },
            credentials,
        );
        self.check(FailAt::ApplyHandle)?;
        Ok(Self::ok(json!({ "success": true })))
    }
}

/// Source fetcher serving a fixed payload and content type, honoring the
/// caller's byte limit.
pub struct FakeFetcher {
    pub content_type: Option<String>,
    pub payload: Vec<u8>,
    pub urls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn serving(content_type: &str) -> Self {
        Self {
            content_type: Some(content_type.to_string()),
            payload: PNG.to_vec(),
            urls: Mutex::new(Vec::new()),
        }
    }
}

impl Default for FakeFetcher {
    fn default() -> Self {
        Self::serving("image/png")
    }
}

#[async_trait]
impl SourceFetcher for FakeFetcher {
    async fn fetch(&self, url: &str, max_bytes: usize) -> Result<FetchedMedia, GatewayError> {
        self.urls.lock().unwrap().push(url.to_string());
        if self.payload.len() > max_bytes {
            return Err(GatewayError::BodyTooLarge {
                received: self.payload.len(),
                limit: max_bytes,
            });
        }
        Ok(FetchedMedia {
            bytes: self.payload.clone(),
            content_type: self.content_type.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout, and a configured app id.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        graph: GraphConfig {
            base_url: "https://graph.example.com".to_string(),
            api_version: "v21.0".to_string(),
            timeout: Duration::from_secs(5),
        },
        app_id: Some(APP_ID.to_string()),
        max_photo_bytes: 1024,
    }
}

/// Build the full application router with all middleware layers, backed by
/// the given test doubles.
pub fn build_test_app_with(
    config: ServerConfig,
    gateway: Arc<FakeGateway>,
    fetcher: Arc<FakeFetcher>,
) -> Router {
    let state = AppState {
        config: Arc::new(config.clone()),
        gateway,
        fetcher,
    };
    build_app_router(state, &config)
}

pub fn build_test_app(gateway: Arc<FakeGateway>) -> Router {
    build_test_app_with(test_config(), gateway, Arc::new(FakeFetcher::default()))
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Request builder pre-populated with credential headers.
pub fn authed(method: &str, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-access-token", TOKEN)
        .header("x-phone-number-id", PHONE_ID)
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    let request = authed("POST", uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// Encode a single file field as `multipart/form-data`.
pub fn multipart_file(field: &str, content_type: &str, data: &[u8]) -> Body {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"photo\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

pub async fn post_multipart(app: Router, uri: &str, body: Body) -> Response<Body> {
    let request = authed("POST", uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
