use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::error::StorageError;
use crate::models::{Contest, Role};
use crate::traits::UserDirectory;

/// The acting identity as carried by a session token.
///
/// `cached_role` is whatever role was current when the token was issued and
/// must not be used for authorization while the directory is reachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub cached_role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestAction {
    Update,
    Delete,
}

impl fmt::Display for ContestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update => write!(f, "edit"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("You do not have permission to {0} this contest")]
    PermissionDenied(ContestAction),
}

/// Where the role used for a decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSource {
    Directory,
    /// The directory lookup failed and the session's cached role was used.
    SessionFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRole {
    pub role: Role,
    pub source: RoleSource,
}

/// Admins may modify any contest; everybody else only the contests they organize.
///
/// The `Organizer` role carries no extra rights here.
pub fn can_modify(acting_user_id: Uuid, authoritative_role: Role, contest: &Contest) -> bool {
    authoritative_role == Role::Admin || contest.organizer_id == acting_user_id
}

/// Re-read the acting user's role from the directory.
///
/// A user that no longer exists, or has been deactivated, is no longer a valid
/// acting identity. A failed lookup degrades to the role cached on the session.
/// An account missing from a reachable directory never falls back to that
/// cached role, even when the token claims `admin`.
pub async fn resolve_authoritative_role<D>(
    directory: &D,
    identity: &SessionIdentity,
) -> Result<ResolvedRole, AccessError>
where
    D: UserDirectory + ?Sized,
{
    match directory.find_by_id(identity.user_id).await {
        Ok(Some(user)) if user.active => Ok(ResolvedRole {
            role: user.role,
            source: RoleSource::Directory,
        }),
        Ok(Some(_)) => {
            tracing::warn!(user_id = %identity.user_id, "Session belongs to a deactivated user");
            Err(AccessError::AuthenticationRequired)
        }
        Ok(None) => {
            tracing::warn!(user_id = %identity.user_id, "Session belongs to an unknown user");
            Err(AccessError::AuthenticationRequired)
        }
        Err(error) => {
            log_directory_lookup_failed(identity, &error);
            Ok(ResolvedRole {
                role: identity.cached_role,
                source: RoleSource::SessionFallback,
            })
        }
    }
}

fn log_directory_lookup_failed(identity: &SessionIdentity, error: &StorageError) {
    tracing::warn!(
        user_id = %identity.user_id,
        cached_role = %identity.cached_role,
        error = %error,
        "Directory lookup failed, falling back to session role (degraded trust)"
    );
}

/// Resolve the role and check it against `contest` for `action`.
pub async fn authorize_contest_change<D>(
    directory: &D,
    identity: &SessionIdentity,
    contest: &Contest,
    action: ContestAction,
) -> Result<ResolvedRole, AccessError>
where
    D: UserDirectory + ?Sized,
{
    let resolved = resolve_authoritative_role(directory, identity).await?;

    if !can_modify(identity.user_id, resolved.role, contest) {
        tracing::warn!(
            user_id = %identity.user_id,
            role = %resolved.role,
            contest_id = %contest.id,
            organizer_id = %contest.organizer_id,
            action = %action,
            "Permission denied"
        );
        return Err(AccessError::PermissionDenied(action));
    }

    Ok(resolved)
}
