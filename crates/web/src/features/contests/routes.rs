use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::handlers::{
    create_contest, delete_contest, get_contest, get_contest_by_slug, list_contests,
    list_localities, list_my_contests, update_contest,
};
use crate::middleware::auth::{SessionKeys, require_auth};
use crate::state::AppState;

pub fn routes(sessions: SessionKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(create_contest))
        .route("/mine", get(list_my_contests))
        .route("/:id", put(update_contest).delete(delete_contest))
        .route_layer(middleware::from_fn_with_state(sessions, require_auth));

    Router::new()
        .route("/", get(list_contests))
        .route("/localities", get(list_localities))
        .route("/slug/:slug", get(get_contest_by_slug))
        .route("/:id", get(get_contest))
        .merge(protected)
}
