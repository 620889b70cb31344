use axum::{Router, extract::DefaultBodyLimit, middleware, routing::post};

use super::handlers::upload_image;
use super::services::MAX_IMAGE_BYTES;
use crate::middleware::auth::{SessionKeys, require_auth};
use crate::state::AppState;

/// Room for the form fields around a maximum-size image
const BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

pub fn routes(sessions: SessionKeys) -> Router<AppState> {
    Router::new()
        .route("/image", post(upload_image))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .route_layer(middleware::from_fn_with_state(sessions, require_auth))
}
