use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::ApiJson;
use crate::{
    error::AppError,
    middleware::CurrentUser,
    models::{Building, BuildingPayload, CustodianAllocation, ListQuery, Room},
    services::{buildings, custodians},
    state::AppState,
};

pub async fn index(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Building>>, AppError> {
    Ok(Json(buildings::list(state.store(), &query).await?))
}

pub async fn all(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<Building>>, AppError> {
    Ok(Json(buildings::all(state.store()).await?))
}

pub async fn search(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<Vec<Building>>, AppError> {
    let query = ListQuery {
        search: Some(name),
        archived: false,
    };
    Ok(Json(buildings::list(state.store(), &query).await?))
}

pub async fn show(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Building>, AppError> {
    Ok(Json(buildings::get(state.store(), id).await?))
}

pub async fn store(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<BuildingPayload>,
) -> Result<(StatusCode, Json<Building>), AppError> {
    user.require_admin()?;
    let building = buildings::create(state.store(), payload).await?;
    Ok((StatusCode::CREATED, Json(building)))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<BuildingPayload>,
) -> Result<Json<Building>, AppError> {
    user.require_admin()?;
    Ok(Json(buildings::update(state.store(), id, payload).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    user.require_admin()?;
    buildings::archive(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn rooms(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Room>>, AppError> {
    Ok(Json(buildings::rooms(state.store(), id).await?))
}

pub async fn custodian_allocate(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<CustodianAllocation>,
) -> Result<Json<Vec<Building>>, AppError> {
    user.require_admin()?;
    Ok(Json(custodians::allocate(state.store(), payload).await?))
}
