//! Per-request credential extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use bizprofile_core::error::CoreError;
use bizprofile_core::types::Credentials;

use crate::error::AppError;
use crate::state::AppState;

/// Header carrying the remote access token.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";
/// Header carrying the phone number (entity) id of the managed profile.
pub const PHONE_NUMBER_ID_HEADER: &str = "x-phone-number-id";
/// Optional header overriding the configured upload app id.
pub const APP_ID_HEADER: &str = "x-app-id";

/// Remote credentials and target entity supplied with the request.
///
/// The token is read from `x-access-token`, falling back to an
/// `Authorization: Bearer <token>` header. Nothing is stored beyond the
/// lifetime of the request.
///
/// ```ignore
/// async fn my_handler(creds: ProfileCredentials) -> AppResult<Json<()>> {
///     tracing::info!(phone_number_id = %creds.phone_number_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ProfileCredentials {
    pub credentials: Credentials,
    pub phone_number_id: String,
    /// App id resolved from `x-app-id` or server configuration.
    pub app_id: Option<String>,
}

impl FromRequestParts<AppState> for ProfileCredentials {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;

        let token = header_value(headers, ACCESS_TOKEN_HEADER)
            .or_else(|| header_value(headers, "authorization").and_then(bearer_token))
            .ok_or_else(|| {
                AppError::Core(CoreError::Validation(format!(
                    "Missing access token. Provide the {ACCESS_TOKEN_HEADER} header"
                )))
            })?;
        let credentials = Credentials::new(token)?;

        let phone_number_id = header_value(headers, PHONE_NUMBER_ID_HEADER)
            .ok_or_else(|| {
                AppError::Core(CoreError::Validation(format!(
                    "Missing phone number id. Provide the {PHONE_NUMBER_ID_HEADER} header"
                )))
            })?
            .to_string();

        let app_id = header_value(headers, APP_ID_HEADER)
            .map(str::to_string)
            .or_else(|| state.config.app_id.clone());

        Ok(ProfileCredentials {
            credentials,
            phone_number_id,
            app_id,
        })
    }
}

/// Trimmed, non-empty header value.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Token of an `Authorization: Bearer <token>` value; the scheme is matched
/// case-insensitively.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
