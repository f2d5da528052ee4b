use axum::routing::post;
use axum::Router;

use crate::handlers::photo;
use crate::state::AppState;

/// Photo routes mounted at `/photo`.
///
/// ```text
/// POST /  -> upload_photo
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(photo::upload_photo))
}
