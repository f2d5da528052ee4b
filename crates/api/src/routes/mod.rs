pub mod health;
pub mod photo;
pub mod profile;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /profile                                         read (GET), update changed fields (POST)
/// /photo                                           replace profile photo (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Business profile fields.
        .nest("/profile", profile::router())
        // Profile photo upload.
        .nest("/photo", photo::router())
}
