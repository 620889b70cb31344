use storage::{
    dto::contest::{ContestQuery, CreateContestRequest, UpdateContestRequest},
    models::{Contest, ContestFilter, LocalityCount},
    services::{
        authorization::{
            ContestAction, SessionIdentity, authorize_contest_change, resolve_authoritative_role,
        },
        slug::allocate_unique_slug,
    },
    traits::{ContestStore, UserDirectory},
};
use uuid::Uuid;

use crate::error::{WebError, WebResult};

/// Public catalog: active contests, soonest first
pub async fn list_contests(store: &dyn ContestStore, query: &ContestQuery) -> WebResult<Vec<Contest>> {
    Ok(store.list(&query.to_filter()).await?)
}

pub async fn locality_counts(store: &dyn ContestStore) -> WebResult<Vec<LocalityCount>> {
    Ok(store.locality_counts().await?)
}

/// Public contest page. Inactive contests are not published.
pub async fn get_contest_by_slug(store: &dyn ContestStore, slug: &str) -> WebResult<Contest> {
    store
        .find_by_slug(slug, None)
        .await?
        .filter(|contest| contest.active)
        .ok_or_else(WebError::contest_not_found)
}

pub async fn get_contest(store: &dyn ContestStore, id: Uuid) -> WebResult<Contest> {
    store
        .find_by_id(id)
        .await?
        .ok_or_else(WebError::contest_not_found)
}

/// Dashboard listing: admins see every contest, everybody else their own.
pub async fn list_own_contests(
    store: &dyn ContestStore,
    directory: &dyn UserDirectory,
    identity: &SessionIdentity,
) -> WebResult<Vec<Contest>> {
    let resolved = resolve_authoritative_role(directory, identity).await?;

    let filter = if resolved.role.is_admin() {
        ContestFilter::default()
    } else {
        ContestFilter {
            organizer_id: Some(identity.user_id),
            ..ContestFilter::default()
        }
    };

    Ok(store.list(&filter).await?)
}

pub async fn create_contest(
    store: &dyn ContestStore,
    directory: &dyn UserDirectory,
    identity: &SessionIdentity,
    request: CreateContestRequest,
) -> WebResult<Contest> {
    let resolved = resolve_authoritative_role(directory, identity).await?;

    let slug = allocate_unique_slug(store, &request.name, None).await?;
    let contest = store
        .insert(request.into_new_contest(slug, identity.user_id))
        .await?;

    tracing::info!(
        contest_id = %contest.id,
        slug = %contest.slug,
        organizer_id = %contest.organizer_id,
        role = %resolved.role,
        "Contest created"
    );

    Ok(contest)
}

/// Apply an allow-listed update. The slug is re-allocated only when the name changes.
pub async fn update_contest(
    store: &dyn ContestStore,
    directory: &dyn UserDirectory,
    identity: &SessionIdentity,
    id: Uuid,
    request: UpdateContestRequest,
) -> WebResult<Contest> {
    let existing = get_contest(store, id).await?;

    authorize_contest_change(directory, identity, &existing, ContestAction::Update).await?;

    let slug = match request.requested_name() {
        Some(name) if name != existing.name => {
            Some(allocate_unique_slug(store, name, Some(id)).await?)
        }
        _ => None,
    };

    let patch = request.into_patch(slug);
    let updated = store
        .update_by_id(id, &patch)
        .await?
        .ok_or_else(WebError::contest_not_found)?;

    tracing::info!(
        contest_id = %updated.id,
        slug = %updated.slug,
        user_id = %identity.user_id,
        "Contest updated"
    );

    Ok(updated)
}

pub async fn delete_contest(
    store: &dyn ContestStore,
    directory: &dyn UserDirectory,
    identity: &SessionIdentity,
    id: Uuid,
) -> WebResult<()> {
    let existing = get_contest(store, id).await?;

    authorize_contest_change(directory, identity, &existing, ContestAction::Delete).await?;

    if !store.delete_by_id(id).await? {
        return Err(WebError::contest_not_found());
    }

    tracing::info!(contest_id = %id, user_id = %identity.user_id, "Contest deleted");

    Ok(())
}
