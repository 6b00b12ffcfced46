use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::ApiJson;
use crate::{
    error::AppError,
    middleware::CurrentUser,
    models::{
        RepairRequest, RequestListQuery, ResolveRepairPayload, ResolveTransferPayload,
        TransferRequest,
    },
    services::requests,
    state::AppState,
};

pub async fn transfers(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<Vec<TransferRequest>>, AppError> {
    Ok(Json(requests::list_transfers(state.store(), &query).await?))
}

pub async fn show_transfer(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<TransferRequest>, AppError> {
    Ok(Json(requests::get_transfer(state.store(), id).await?))
}

pub async fn resolve_transfer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<ResolveTransferPayload>,
) -> Result<Json<TransferRequest>, AppError> {
    Ok(Json(
        requests::resolve_transfer(state.store(), &user, id, payload).await?,
    ))
}

pub async fn repairs(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<Vec<RepairRequest>>, AppError> {
    Ok(Json(requests::list_repairs(state.store(), &query).await?))
}

pub async fn show_repair(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<RepairRequest>, AppError> {
    Ok(Json(requests::get_repair(state.store(), id).await?))
}

pub async fn resolve_repair(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<ResolveRepairPayload>,
) -> Result<Json<RepairRequest>, AppError> {
    Ok(Json(
        requests::resolve_repair(state.store(), &user, id, payload).await?,
    ))
}
