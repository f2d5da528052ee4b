//! Downloads profile photo sources given by URL.

use std::time::Duration;

use async_trait::async_trait;
use bizprofile_core::gateway::{FetchedMedia, GatewayError, SourceFetcher};
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect;

use crate::api::GraphSetupError;
use crate::body::{parse_error_body, transport_error};

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 5;

/// [`SourceFetcher`] backed by a plain `reqwest` GET.
///
/// Redirects are only followed to `https` targets, and bodies are read in
/// chunks so an oversized source is abandoned as soon as it crosses the
/// caller's limit.
pub struct HttpSourceFetcher {
    client: reqwest::Client,
}

impl HttpSourceFetcher {
    pub fn new(timeout: Duration) -> Result<Self, GraphSetupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(https_redirects())
            .build()?;
        Ok(Self { client })
    }
}

/// Follow at most [`MAX_REDIRECTS`] hops, and only to `https` URLs.
fn https_redirects() -> redirect::Policy {
    redirect::Policy::custom(|attempt| {
        if attempt.url().scheme() != "https" {
            let target = attempt.url().to_string();
            attempt.error(format!("refusing redirect to non-https URL {target}"))
        } else if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else {
            attempt.follow()
        }
    })
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
    async fn fetch(&self, url: &str, max_bytes: usize) -> Result<FetchedMedia, GatewayError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Photo source returned an error");
            return Err(GatewayError::Remote {
                status: status.as_u16(),
                body: parse_error_body(&text),
            });
        }

        if let Some(declared) = response.content_length() {
            let declared = usize::try_from(declared).unwrap_or(usize::MAX);
            if declared > max_bytes {
                tracing::warn!(declared, max_bytes, "Photo source too large");
                return Err(GatewayError::BodyTooLarge {
                    received: declared,
                    limit: max_bytes,
                });
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(transport_error)? {
            if bytes.len() + chunk.len() > max_bytes {
                tracing::warn!(
                    received = bytes.len() + chunk.len(),
                    max_bytes,
                    "Photo source exceeded size limit while streaming"
                );
                return Err(GatewayError::BodyTooLarge {
                    received: bytes.len() + chunk.len(),
                    limit: max_bytes,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!(
            byte_length = bytes.len(),
            content_type = content_type.as_deref().unwrap_or("<none>"),
            "Fetched photo source"
        );

        Ok(FetchedMedia {
            bytes,
            content_type,
        })
    }
}
