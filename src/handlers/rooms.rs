use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::ApiJson;
use crate::{
    error::AppError,
    middleware::CurrentUser,
    models::{ListQuery, Room, RoomAllocation, RoomPayload},
    services::rooms,
    state::AppState,
};

pub async fn index(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Room>>, AppError> {
    Ok(Json(rooms::list(state.store(), &query).await?))
}

pub async fn all(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<Room>>, AppError> {
    Ok(Json(rooms::all(state.store()).await?))
}

pub async fn unallocated(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<Room>>, AppError> {
    Ok(Json(rooms::unallocated(state.store()).await?))
}

pub async fn show(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Room>, AppError> {
    Ok(Json(rooms::get(state.store(), id).await?))
}

pub async fn store(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<RoomPayload>,
) -> Result<(StatusCode, Json<Room>), AppError> {
    user.require_admin()?;
    let room = rooms::create(state.store(), payload).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<RoomPayload>,
) -> Result<Json<Room>, AppError> {
    user.require_admin()?;
    Ok(Json(rooms::update(state.store(), id, payload).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    user.require_admin()?;
    rooms::archive(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn allocate(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<RoomAllocation>,
) -> Result<Json<Room>, AppError> {
    user.require_admin()?;
    Ok(Json(rooms::allocate(state.store(), id, payload).await?))
}

pub async fn unallocate(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Room>, AppError> {
    user.require_admin()?;
    Ok(Json(rooms::unallocate(state.store(), id).await?))
}
