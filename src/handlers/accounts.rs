use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::ApiJson;
use crate::{
    error::AppError,
    middleware::CurrentUser,
    models::{AccountPayload, AccountUpdatePayload, UserResponse},
    services::accounts::{self, AccountListQuery},
    state::AppState,
};

pub async fn index(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<AccountListQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    user.require_admin()?;
    let users = accounts::list(state.store(), &query).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn show(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    user.require_admin()?;
    Ok(Json(accounts::get(state.store(), id).await?.into()))
}

pub async fn store(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<AccountPayload>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    user.require_admin()?;
    let account = accounts::create(state.store(), &state.config, payload).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<AccountUpdatePayload>,
) -> Result<Json<UserResponse>, AppError> {
    user.require_admin()?;
    let account = accounts::update(state.store(), &state.config, id, payload).await?;
    Ok(Json(account.into()))
}

pub async fn destroy(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    user.require_admin()?;
    accounts::archive(state.store(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
