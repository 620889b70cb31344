use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{current_session, login, oauth_sign_in, register};
use crate::middleware::auth::{SessionKeys, require_auth};
use crate::state::AppState;

pub fn routes(sessions: SessionKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/session", get(current_session))
        .route_layer(middleware::from_fn_with_state(sessions, require_auth));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/oauth", post(oauth_sign_in))
        .merge(protected)
}
