use storage::{
    dto::user::{LoginRequest, OAuthSignInRequest, RegisterRequest, SessionResponse, UserResponse},
    models::User,
    services::{accounts, authorization::SessionIdentity},
    traits::UserDirectory,
};

use crate::error::{WebError, WebResult};
use crate::middleware::auth::SessionKeys;

fn session_for(keys: &SessionKeys, user: User) -> WebResult<SessionResponse> {
    let issued = keys.issue(&user)?;

    Ok(SessionResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user: UserResponse::from(user),
    })
}

pub async fn register(directory: &dyn UserDirectory, request: &RegisterRequest) -> WebResult<User> {
    Ok(accounts::register(directory, request).await?)
}

pub async fn login(
    directory: &dyn UserDirectory,
    keys: &SessionKeys,
    request: &LoginRequest,
) -> WebResult<SessionResponse> {
    let user = accounts::verify_credentials(directory, &request.email, &request.password).await?;

    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    session_for(keys, user)
}

/// Sign in an identity verified by the OAuth provider, creating its account on
/// first use.
pub async fn oauth_sign_in(
    directory: &dyn UserDirectory,
    keys: &SessionKeys,
    request: &OAuthSignInRequest,
) -> WebResult<SessionResponse> {
    let user = accounts::provision_oauth_user(directory, &request.email, &request.name).await?;

    if !user.active {
        tracing::warn!(user_id = %user.id, "OAuth sign-in for a deactivated account");
        return Err(WebError::authentication_required());
    }

    tracing::info!(user_id = %user.id, role = %user.role, "User signed in with OAuth");

    session_for(keys, user)
}

/// Compare without stopping at the first differing byte.
pub fn bridge_key_matches(expected: &str, presented: &str) -> bool {
    expected.len() == presented.len()
        && expected
            .bytes()
            .zip(presented.bytes())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

/// Re-read the session's user and issue a token carrying the current role.
pub async fn refresh_session(
    directory: &dyn UserDirectory,
    keys: &SessionKeys,
    identity: &SessionIdentity,
) -> WebResult<SessionResponse> {
    let user = directory
        .find_by_id(identity.user_id)
        .await?
        .filter(|user| user.active)
        .ok_or_else(WebError::authentication_required)?;

    if user.role != identity.cached_role {
        tracing::info!(
            user_id = %user.id,
            cached_role = %identity.cached_role,
            role = %user.role,
            "Session role refreshed"
        );
    }

    session_for(keys, user)
}
