use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::models::{Role, User};
use storage::services::authorization::SessionIdentity;
use uuid::Uuid;

use crate::error::WebError;

/// Claims carried by a session token. `role` is only a cache of the
/// directory role at issue time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            user_id: self.sub,
            email: self.email.clone(),
            cached_role: self.role,
        }
    }
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 signing and verification keys for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    inner: Arc<KeysInner>,
}

struct KeysInner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(KeysInner {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                ttl,
            }),
        }
    }

    pub fn issue(&self, user: &User) -> Result<IssuedSession, WebError> {
        self.issue_at(user, Utc::now())
    }

    fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedSession, WebError> {
        let expires_at = now
            .checked_add_signed(self.inner.ttl)
            .ok_or_else(|| WebError::InternalServerError("Session expiry out of range".to_string()))?;
        let claims = SessionClaims {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.inner.encoding)
            .map_err(|e| WebError::InternalServerError(format!("Token signing failed: {}", e)))?;

        Ok(IssuedSession { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, WebError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<SessionClaims>(token, &self.inner.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!("Rejected session token: {}", e);
                WebError::authentication_required()
            })
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Reject requests without a valid session token and expose the session to
/// handlers as `Extension<SessionIdentity>`.
pub async fn require_auth(
    State(keys): State<SessionKeys>,
    mut request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let Some(token) = bearer_token(&request) else {
        return Err(WebError::authentication_required());
    };

    let claims = keys.verify(token)?;

    request.extensions_mut().insert(claims.identity());

    Ok(next.run(request).await)
}
