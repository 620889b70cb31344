use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use storage::{
    dto::user::{LoginRequest, OAuthSignInRequest, RegisterRequest, SessionResponse, UserResponse},
    services::authorization::SessionIdentity,
};
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

/// Header carrying the shared key of the OAuth bridge
pub const OAUTH_BRIDGE_HEADER: &str = "x-oauth-bridge-key";

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let user = services::register(state.users.as_ref(), &req).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = SessionResponse),
        (status = 401, description = "Invalid email or password")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let session = services::login(state.users.as_ref(), &state.sessions, &req).await?;

    Ok(Json(session).into_response())
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Session re-issued with the current role", body = SessionResponse),
        (status = 401, description = "Authentication required")
    ),
    tag = "auth"
)]
pub async fn current_session(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
) -> Result<Response, WebError> {
    let session =
        services::refresh_session(state.users.as_ref(), &state.sessions, &identity).await?;

    Ok(Json(session).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auth/oauth",
    request_body = OAuthSignInRequest,
    params(
        ("x-oauth-bridge-key" = String, Header, description = "Shared key of the OAuth bridge")
    ),
    responses(
        (status = 200, description = "Session issued, account created on first sign-in", body = SessionResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Bad bridge key or deactivated account"),
        (status = 503, description = "OAuth sign-in is not configured")
    ),
    tag = "auth"
)]
pub async fn oauth_sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<OAuthSignInRequest>,
) -> Result<Response, WebError> {
    let Some(secret) = state.oauth_bridge_secret.as_deref() else {
        return Err(WebError::ServiceUnavailable(
            "OAuth sign-in is not configured".to_string(),
        ));
    };

    let presented = headers
        .get(OAUTH_BRIDGE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !services::bridge_key_matches(secret, presented) {
        tracing::warn!("Rejected OAuth sign-in with a bad bridge key");
        return Err(WebError::authentication_required());
    }

    req.validate()?;

    let session = services::oauth_sign_in(state.users.as_ref(), &state.sessions, &req).await?;

    Ok(Json(session).into_response())
}
