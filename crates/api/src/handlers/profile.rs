//! Handlers for reading and updating the remote business profile.

use axum::extract::State;
use axum::Json;
use bizprofile_core::changeset::{compute, DiffEntry};
use bizprofile_core::profile::{normalize_profile, ProfileFields};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppResult;
use crate::middleware::credentials::ProfileCredentials;
use crate::state::AppState;

/// Normalized profile plus the untouched remote body.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// Remote HTTP status.
    pub status: u16,
    pub data: ProfileFields,
    pub raw: Value,
}

/// Candidate field values, optionally with the baseline the client edited.
///
/// Without a baseline every non-blank field is submitted.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(flatten)]
    pub proposed: ProfileFields,
    #[serde(default)]
    pub baseline: Option<ProfileFields>,
}

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    /// Remote HTTP status.
    pub status: u16,
    /// Remote acknowledgement body.
    pub data: Value,
    pub diffs: Vec<DiffEntry>,
}

/// GET /api/profile
pub async fn get_profile(
    State(state): State<AppState>,
    creds: ProfileCredentials,
) -> AppResult<Json<ProfileResponse>> {
    let raw = state
        .gateway
        .get_profile(&creds.phone_number_id, &creds.credentials)
        .await?;

    Ok(Json(ProfileResponse {
        status: raw.status,
        data: normalize_profile(&raw.body),
        raw: raw.body,
    }))
}

/// POST /api/profile
///
/// Recomputes the changeset server-side and submits only changed,
/// non-blank fields. An empty changeset is rejected without a remote call.
pub async fn update_profile(
    State(state): State<AppState>,
    creds: ProfileCredentials,
    Json(input): Json<UpdateProfileRequest>,
) -> AppResult<Json<UpdateProfileResponse>> {
    let baseline = input.baseline.unwrap_or_default();
    let computed = compute(&baseline, &input.proposed);

    for diff in &computed.diffs {
        tracing::debug!(phone_number_id = %creds.phone_number_id, %diff, "Profile field changed");
    }

    let ack = state
        .coordinator()
        .submit(&creds.phone_number_id, &creds.credentials, &computed.changes)
        .await?;

    Ok(Json(UpdateProfileResponse {
        status: ack.status,
        data: ack.body,
        diffs: computed.diffs,
    }))
}
