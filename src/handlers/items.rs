use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::ApiJson;
use crate::{
    error::AppError,
    middleware::CurrentUser,
    models::{
        ItemPayload, ItemRoomAllocation, ItemView, RepairRequest, RepairRequestPayload, Role,
        TransferRequest, TransferRequestPayload,
    },
    services::{
        inventory,
        requests::{self, ItemHistory},
    },
    state::AppState,
    workflow::ItemState,
};

pub async fn show(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ItemView>, AppError> {
    Ok(Json(inventory::get_item(state.store(), id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<ItemPayload>,
) -> Result<Json<ItemView>, AppError> {
    user.require(&[Role::Custodian])?;
    Ok(Json(inventory::update_item(state.store(), id, payload).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    user.require(&[Role::Custodian])?;
    inventory::archive_item(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn allocate_room(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<ItemRoomAllocation>,
) -> Result<Json<ItemView>, AppError> {
    user.require_admin()?;
    Ok(Json(inventory::allocate_item(state.store(), id, payload).await?))
}

pub async fn unallocate_room(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ItemView>, AppError> {
    user.require_admin()?;
    Ok(Json(inventory::unallocate_item(state.store(), id).await?))
}

pub async fn status(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ItemState>, AppError> {
    Ok(Json(inventory::item_state(state.store(), id).await?))
}

pub async fn history(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ItemHistory>, AppError> {
    Ok(Json(requests::item_history(state.store(), id).await?))
}

pub async fn request_transfer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<TransferRequestPayload>,
) -> Result<(StatusCode, Json<TransferRequest>), AppError> {
    let request = requests::submit_transfer(state.store(), &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn request_repair(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<RepairRequestPayload>,
) -> Result<(StatusCode, Json<RepairRequest>), AppError> {
    let request = requests::submit_repair(state.store(), &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(request)))
}
