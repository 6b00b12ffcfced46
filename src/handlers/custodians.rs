use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppError,
    middleware::CurrentUser,
    models::{Building, ItemView},
    services::custodians,
    state::AppState,
};

fn ensure_self_or_admin(user: &CurrentUser, custodian_id: i64) -> Result<(), AppError> {
    if user.id == custodian_id {
        return Ok(());
    }
    user.require_admin()
}

pub async fn buildings(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Building>>, AppError> {
    ensure_self_or_admin(&user, id)?;
    Ok(Json(custodians::buildings(state.store(), id).await?))
}

pub async fn inventory(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ItemView>>, AppError> {
    ensure_self_or_admin(&user, id)?;
    Ok(Json(custodians::inventory(state.store(), id).await?))
}
