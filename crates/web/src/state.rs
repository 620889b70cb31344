use axum::extract::FromRef;
use std::sync::Arc;
use storage::traits::{ContestStore, UserDirectory};

use crate::features::uploads::client::ImageHost;
use crate::middleware::auth::SessionKeys;

/// Shared handler state. Collaborators are trait objects so the router can run
/// against Postgres or the in-memory stores.
#[derive(Clone)]
pub struct AppState {
    pub contests: Arc<dyn ContestStore>,
    pub users: Arc<dyn UserDirectory>,
    pub sessions: SessionKeys,
    /// `None` when OAuth sign-in is not configured
    pub oauth_bridge_secret: Option<Arc<str>>,
    /// `None` when uploads are not configured
    pub images: Option<Arc<dyn ImageHost>>,
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
