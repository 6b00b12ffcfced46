use log::info;

use super::{check, inventory};
use crate::{
    error::AppError,
    models::{Building, CustodianAllocation, ItemView, Role, User},
    store::{ItemFilter, RoomFilter, Store},
};

async fn find_custodian(store: &dyn Store, id: i64) -> Result<User, AppError> {
    let user = store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;
    if user.role != Role::Custodian {
        return Err(AppError::invalid(
            "custodian_id",
            format!("User {id} is not a custodian."),
        ));
    }
    Ok(user)
}

/// Replaces the set of buildings the custodian looks after.
pub async fn allocate(
    store: &dyn Store,
    payload: CustodianAllocation,
) -> Result<Vec<Building>, AppError> {
    check(&payload, &[])?;
    let custodian_id = payload.custodian_id.ok_or_else(|| {
        AppError::invalid("custodian_id", "The custodian id field is required.")
    })?;
    let custodian = find_custodian(store, custodian_id).await?;

    for building_id in &payload.building_ids {
        if store.find_building(*building_id).await?.is_none() {
            return Err(AppError::not_found("Building", *building_id));
        }
    }

    store
        .set_custodian_buildings(custodian.id, &payload.building_ids)
        .await?;
    info!(
        "Custodian {} now covers buildings {:?}",
        custodian.id, payload.building_ids
    );
    store.custodian_buildings(custodian.id).await
}

pub async fn buildings(store: &dyn Store, custodian_id: i64) -> Result<Vec<Building>, AppError> {
    let custodian = find_custodian(store, custodian_id).await?;
    store.custodian_buildings(custodian.id).await
}

/// Items placed in any room of the custodian's buildings.
pub async fn inventory(store: &dyn Store, custodian_id: i64) -> Result<Vec<ItemView>, AppError> {
    let buildings = buildings(store, custodian_id).await?;
    if buildings.is_empty() {
        return Ok(Vec::new());
    }

    let rooms = store
        .list_rooms(&RoomFilter {
            building_ids: Some(buildings.iter().map(|b| b.id).collect()),
            ..RoomFilter::default()
        })
        .await?;
    if rooms.is_empty() {
        return Ok(Vec::new());
    }

    let items = store
        .list_items(&ItemFilter {
            room_ids: Some(rooms.iter().map(|r| r.id).collect()),
            ..ItemFilter::default()
        })
        .await?;
    inventory::views(store, items).await
}
