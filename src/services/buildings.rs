use log::info;

use super::check;
use crate::{
    error::AppError,
    models::{Building, BuildingPayload, ListQuery, Room},
    store::{ListFilter, RoomFilter, Store},
};

pub async fn list(store: &dyn Store, query: &ListQuery) -> Result<Vec<Building>, AppError> {
    store
        .list_buildings(&ListFilter {
            search: query.search_term().map(str::to_string),
            archived: query.archived,
        })
        .await
}

/// Every active building, unfiltered.
pub async fn all(store: &dyn Store) -> Result<Vec<Building>, AppError> {
    store.list_buildings(&ListFilter::default()).await
}

pub async fn get(store: &dyn Store, id: i64) -> Result<Building, AppError> {
    store
        .find_building(id)
        .await?
        .ok_or_else(|| AppError::not_found("Building", id))
}

pub async fn create(store: &dyn Store, payload: BuildingPayload) -> Result<Building, AppError> {
    check(&payload, &[("name", payload.name.as_str())])?;
    let building = store.insert_building(payload.name.trim()).await?;
    info!("Created building {} ({})", building.id, building.name);
    Ok(building)
}

pub async fn update(
    store: &dyn Store,
    id: i64,
    payload: BuildingPayload,
) -> Result<Building, AppError> {
    check(&payload, &[("name", payload.name.as_str())])?;
    store
        .update_building(id, payload.name.trim())
        .await?
        .ok_or_else(|| AppError::not_found("Building", id))
}

/// Hides the building from default listings. Its rooms keep their `building_id`.
pub async fn archive(store: &dyn Store, id: i64) -> Result<(), AppError> {
    if !store.archive_building(id).await? {
        return Err(AppError::not_found("Building", id));
    }
    info!("Archived building {}", id);
    Ok(())
}

pub async fn rooms(store: &dyn Store, id: i64) -> Result<Vec<Room>, AppError> {
    let building = get(store, id).await?;
    store
        .list_rooms(&RoomFilter {
            building_ids: Some(vec![building.id]),
            ..RoomFilter::default()
        })
        .await
}
