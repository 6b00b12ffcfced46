use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::ApiJson;
use crate::{
    error::AppError,
    middleware::CurrentUser,
    models::{
        InventoryParentItem, ItemListQuery, ItemPayload, ItemRoomAllocation, ItemView, ListQuery,
        ParentItemPayload, Role,
    },
    services::inventory,
    state::AppState,
};

pub async fn index(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<InventoryParentItem>>, AppError> {
    Ok(Json(inventory::list_parents(state.store(), &query).await?))
}

pub async fn show(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<InventoryParentItem>, AppError> {
    Ok(Json(inventory::get_parent(state.store(), id).await?))
}

pub async fn store(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(payload): ApiJson<ParentItemPayload>,
) -> Result<(StatusCode, Json<InventoryParentItem>), AppError> {
    user.require_admin()?;
    let parent = inventory::create_parent(state.store(), payload).await?;
    Ok((StatusCode::CREATED, Json(parent)))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<ParentItemPayload>,
) -> Result<Json<InventoryParentItem>, AppError> {
    user.require_admin()?;
    Ok(Json(inventory::update_parent(state.store(), id, payload).await?))
}

pub async fn destroy(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    user.require_admin()?;
    inventory::archive_parent(state.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn items(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<ItemListQuery>,
) -> Result<Json<Vec<ItemView>>, AppError> {
    Ok(Json(inventory::list_items(state.store(), id, &query).await?))
}

pub async fn store_item(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<ItemPayload>,
) -> Result<(StatusCode, Json<ItemView>), AppError> {
    user.require(&[Role::Custodian])?;
    let item = inventory::create_item(state.store(), id, payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Legacy allocation route: `id` names the item instance, not the parent item.
pub async fn allocate_room(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<ItemRoomAllocation>,
) -> Result<Json<ItemView>, AppError> {
    user.require_admin()?;
    Ok(Json(inventory::allocate_item(state.store(), id, payload).await?))
}
