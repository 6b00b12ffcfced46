use log::info;

use super::{check, placement};
use crate::{
    error::AppError,
    models::{ListQuery, Room, RoomAllocation, RoomPayload},
    store::{NewRoom, RoomFilter, Store},
};

pub async fn list(store: &dyn Store, query: &ListQuery) -> Result<Vec<Room>, AppError> {
    store
        .list_rooms(&RoomFilter {
            search: query.search_term().map(str::to_string),
            archived: query.archived,
            ..RoomFilter::default()
        })
        .await
}

pub async fn all(store: &dyn Store) -> Result<Vec<Room>, AppError> {
    store.list_rooms(&RoomFilter::default()).await
}

pub async fn unallocated(store: &dyn Store) -> Result<Vec<Room>, AppError> {
    store
        .list_rooms(&RoomFilter {
            unallocated_only: true,
            ..RoomFilter::default()
        })
        .await
}

pub async fn get(store: &dyn Store, id: i64) -> Result<Room, AppError> {
    store
        .find_room(id)
        .await?
        .ok_or_else(|| AppError::not_found("Room", id))
}

async fn ensure_building(store: &dyn Store, building_id: Option<i64>) -> Result<(), AppError> {
    if let Some(building_id) = building_id {
        if store.find_building(building_id).await?.is_none() {
            return Err(AppError::not_found("Building", building_id));
        }
    }
    Ok(())
}

fn new_room(payload: RoomPayload) -> NewRoom {
    NewRoom {
        name: payload.name.trim().to_string(),
        room_type: payload.room_type.trim().to_string(),
        building_id: payload.building_id,
    }
}

pub async fn create(store: &dyn Store, payload: RoomPayload) -> Result<Room, AppError> {
    check(
        &payload,
        &[("name", payload.name.as_str()), ("room_type", payload.room_type.as_str())],
    )?;
    ensure_building(store, payload.building_id).await?;
    let room = store.insert_room(new_room(payload)).await?;
    info!("Created room {} ({})", room.id, room.name);
    Ok(room)
}

/// Updates a room. An omitted `building_id` keeps the current building.
pub async fn update(store: &dyn Store, id: i64, payload: RoomPayload) -> Result<Room, AppError> {
    check(
        &payload,
        &[("name", payload.name.as_str()), ("room_type", payload.room_type.as_str())],
    )?;
    let room = get(store, id).await?;
    ensure_building(store, payload.building_id).await?;
    let building_id = placement(room.building_id, payload.building_id, |current| {
        AppError::Conflict(format!(
            "Room {} is already allocated to building {}",
            room.id, current
        ))
    })?;

    store
        .update_room(
            id,
            NewRoom {
                building_id,
                ..new_room(payload)
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("Room", id))
}

pub async fn archive(store: &dyn Store, id: i64) -> Result<(), AppError> {
    if !store.archive_room(id).await? {
        return Err(AppError::not_found("Room", id));
    }
    info!("Archived room {}", id);
    Ok(())
}

/// Assigns the room to a building. Re-allocating to the same building is a no-op; a room
/// that already belongs elsewhere must be unallocated first.
pub async fn allocate(
    store: &dyn Store,
    room_id: i64,
    payload: RoomAllocation,
) -> Result<Room, AppError> {
    check(&payload, &[])?;
    let building_id = payload
        .building_id
        .ok_or_else(|| AppError::invalid("building_id", "The building id field is required."))?;

    let room = get(store, room_id).await?;
    ensure_building(store, Some(building_id)).await?;

    match room.building_id {
        Some(current) if current == building_id => Ok(room),
        Some(current) => Err(AppError::Conflict(format!(
            "Room {} is already allocated to building {}",
            room.id, current
        ))),
        None => {
            let room = store
                .set_room_building(room_id, Some(building_id))
                .await?
                .ok_or_else(|| AppError::not_found("Room", room_id))?;
            info!("Allocated room {} to building {}", room_id, building_id);
            Ok(room)
        }
    }
}

pub async fn unallocate(store: &dyn Store, room_id: i64) -> Result<Room, AppError> {
    let room = store
        .set_room_building(room_id, None)
        .await?
        .ok_or_else(|| AppError::not_found("Room", room_id))?;
    info!("Unallocated room {}", room_id);
    Ok(room)
}
