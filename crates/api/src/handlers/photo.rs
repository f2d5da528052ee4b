//! Handler for replacing the profile photo.
//!
//! Accepts either a multipart upload (field `file`, or a text field
//! `image_url`) or a JSON body `{ "image_url": "https://..." }`.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use bizprofile_core::upload::{PhotoSource, UploadError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::middleware::credentials::ProfileCredentials;
use crate::state::AppState;

/// JSON body for URL-sourced photos.
#[derive(Debug, Deserialize)]
pub struct PhotoUrlRequest {
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    /// Remote HTTP status of the final apply call.
    pub status: u16,
    pub upload_id: String,
    pub handle: String,
    /// Remote acknowledgement body of the apply call.
    pub apply: Value,
}

/// POST /api/photo
pub async fn upload_photo(
    State(state): State<AppState>,
    creds: ProfileCredentials,
    request: Request,
) -> AppResult<Json<PhotoResponse>> {
    let app_id = creds.app_id.clone().ok_or(UploadError::MissingAppId)?;

    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let source = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        read_multipart_source(multipart).await?
    } else if content_type.starts_with("application/json") {
        let Json(body) = Json::<PhotoUrlRequest>::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        PhotoSource::Url(body.image_url)
    } else {
        return Err(AppError::BadRequest(
            "Expected multipart/form-data or application/json".into(),
        ));
    };

    let outcome = state
        .orchestrator()
        .run(&creds.phone_number_id, &app_id, &creds.credentials, source)
        .await?;

    tracing::info!(
        phone_number_id = %creds.phone_number_id,
        upload_id = %outcome.upload_id,
        "Profile photo applied"
    );

    Ok(Json(PhotoResponse {
        status: outcome.apply.status,
        upload_id: outcome.upload_id,
        handle: outcome.handle,
        apply: outcome.apply.body,
    }))
}

/// Pull the photo source out of a multipart body. A `file` field wins over
/// an `image_url` field.
async fn read_multipart_source(mut multipart: Multipart) -> AppResult<PhotoSource> {
    let mut file: Option<PhotoSource> = None;
    let mut image_url: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let declared_mime = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                file = Some(PhotoSource::Bytes {
                    data: data.to_vec(),
                    declared_mime,
                });
            }
            "image_url" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                let text = text.trim().to_string();
                if !text.is_empty() {
                    image_url = Some(text);
                }
            }
            _ => {} // ignore unknown fields
        }
    }

    file.or(image_url.map(PhotoSource::Url)).ok_or_else(|| {
        AppError::BadRequest("Missing required 'file' or 'image_url' field".into())
    })
}
