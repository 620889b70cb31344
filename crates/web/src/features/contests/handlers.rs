use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::contest::{ContestQuery, ContestResponse, CreateContestRequest, UpdateContestRequest},
    models::LocalityCount,
    services::authorization::SessionIdentity,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

fn to_responses(contests: Vec<storage::models::Contest>) -> Vec<ContestResponse> {
    contests.into_iter().map(ContestResponse::from).collect()
}

#[utoipa::path(
    get,
    path = "/api/contests",
    params(ContestQuery),
    responses(
        (status = 200, description = "Active contests ordered by event date", body = Vec<ContestResponse>)
    ),
    tag = "contests"
)]
pub async fn list_contests(
    State(state): State<AppState>,
    Query(query): Query<ContestQuery>,
) -> Result<Response, WebError> {
    let contests = services::list_contests(state.contests.as_ref(), &query).await?;

    Ok(Json(to_responses(contests)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/contests/localities",
    responses(
        (status = 200, description = "Number of active contests per locality", body = Vec<LocalityCount>)
    ),
    tag = "contests"
)]
pub async fn list_localities(State(state): State<AppState>) -> Result<Response, WebError> {
    let counts = services::locality_counts(state.contests.as_ref()).await?;

    Ok(Json(counts).into_response())
}

#[utoipa::path(
    get,
    path = "/api/contests/slug/{slug}",
    params(
        ("slug" = String, Path, description = "Contest slug")
    ),
    responses(
        (status = 200, description = "Contest found", body = ContestResponse),
        (status = 404, description = "Contest not found or not active")
    ),
    tag = "contests"
)]
pub async fn get_contest_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, WebError> {
    let contest = services::get_contest_by_slug(state.contests.as_ref(), &slug).await?;

    Ok(Json(ContestResponse::from(contest)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/contests/{id}",
    params(
        ("id" = Uuid, Path, description = "Contest ID")
    ),
    responses(
        (status = 200, description = "Contest found", body = ContestResponse),
        (status = 404, description = "Contest not found")
    ),
    tag = "contests"
)]
pub async fn get_contest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let contest = services::get_contest(state.contests.as_ref(), id).await?;

    Ok(Json(ContestResponse::from(contest)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/contests/mine",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Contests managed by the caller (all contests for admins)", body = Vec<ContestResponse>),
        (status = 401, description = "Authentication required")
    ),
    tag = "contests"
)]
pub async fn list_my_contests(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
) -> Result<Response, WebError> {
    let contests =
        services::list_own_contests(state.contests.as_ref(), state.users.as_ref(), &identity)
            .await?;

    Ok(Json(to_responses(contests)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/contests",
    request_body = CreateContestRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Contest created successfully", body = ContestResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 409, description = "Slug conflict")
    ),
    tag = "contests"
)]
pub async fn create_contest(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Json(req): Json<CreateContestRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let contest =
        services::create_contest(state.contests.as_ref(), state.users.as_ref(), &identity, req)
            .await?;

    Ok((StatusCode::CREATED, Json(ContestResponse::from(contest))).into_response())
}

#[utoipa::path(
    put,
    path = "/api/contests/{id}",
    params(
        ("id" = Uuid, Path, description = "Contest ID")
    ),
    request_body = UpdateContestRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Contest updated successfully", body = ContestResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the organizer of this contest"),
        (status = 404, description = "Contest not found")
    ),
    tag = "contests"
)]
pub async fn update_contest(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<Uuid>,
    Json(update_req): Json<UpdateContestRequest>,
) -> Result<Response, WebError> {
    update_req.validate()?;

    let updated = services::update_contest(
        state.contests.as_ref(),
        state.users.as_ref(),
        &identity,
        id,
        update_req,
    )
    .await?;

    Ok(Json(ContestResponse::from(updated)).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/contests/{id}",
    params(
        ("id" = Uuid, Path, description = "Contest ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Contest deleted successfully"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Not the organizer of this contest"),
        (status = 404, description = "Contest not found")
    ),
    tag = "contests"
)]
pub async fn delete_contest(
    State(state): State<AppState>,
    Extension(identity): Extension<SessionIdentity>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    services::delete_contest(state.contests.as_ref(), state.users.as_ref(), &identity, id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
