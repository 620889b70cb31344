use axum::Router;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::features::{auth, contests, uploads};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let sessions = state.sessions.clone();

    let api = Router::new()
        .nest("/contests", contests::routes::routes(sessions.clone()))
        .nest("/auth", auth::routes::routes(sessions.clone()))
        .nest("/uploads", uploads::routes::routes(sessions));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
