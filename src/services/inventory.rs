use std::collections::HashMap;

use log::info;

use super::{check, optional_text, placement};
use crate::{
    error::AppError,
    models::{
        InventoryItem, InventoryParentItem, ItemListQuery, ItemPayload, ItemRoomAllocation,
        ItemView, ListQuery, ParentItemPayload,
    },
    store::{ItemChanges, ItemFilter, ListFilter, NewItem, NewParentItem, Store},
    workflow::{self, ItemState, ItemStatus},
};

// Parent items

pub async fn list_parents(
    store: &dyn Store,
    query: &ListQuery,
) -> Result<Vec<InventoryParentItem>, AppError> {
    store
        .list_parent_items(&ListFilter {
            search: query.search_term().map(str::to_string),
            archived: query.archived,
        })
        .await
}

pub async fn get_parent(store: &dyn Store, id: i64) -> Result<InventoryParentItem, AppError> {
    store
        .find_parent_item(id)
        .await?
        .ok_or_else(|| AppError::not_found("Inventory item", id))
}

fn new_parent(payload: ParentItemPayload) -> Result<NewParentItem, AppError> {
    let item_type = payload
        .item_type
        .ok_or_else(|| AppError::invalid("item_type", "The item type field is required."))?;
    Ok(NewParentItem {
        name: payload.name.trim().to_string(),
        item_type,
        description: optional_text(payload.description),
    })
}

pub async fn create_parent(
    store: &dyn Store,
    payload: ParentItemPayload,
) -> Result<InventoryParentItem, AppError> {
    check(&payload, &[("name", payload.name.as_str())])?;
    let parent = store.insert_parent_item(new_parent(payload)?).await?;
    info!("Created inventory item {} ({})", parent.id, parent.name);
    Ok(parent)
}

pub async fn update_parent(
    store: &dyn Store,
    id: i64,
    payload: ParentItemPayload,
) -> Result<InventoryParentItem, AppError> {
    check(&payload, &[("name", payload.name.as_str())])?;
    store
        .update_parent_item(id, new_parent(payload)?)
        .await?
        .ok_or_else(|| AppError::not_found("Inventory item", id))
}

pub async fn archive_parent(store: &dyn Store, id: i64) -> Result<(), AppError> {
    if !store.archive_parent_item(id).await? {
        return Err(AppError::not_found("Inventory item", id));
    }
    info!("Archived inventory item {}", id);
    Ok(())
}

// Item instances

/// Attaches parent/room names and the resolved workflow state to each item.
pub async fn views(
    store: &dyn Store,
    items: Vec<InventoryItem>,
) -> Result<Vec<ItemView>, AppError> {
    let ids: Vec<i64> = items.iter().map(|item| item.id).collect();
    let mut latest = store.latest_requests(&ids).await?;

    let mut parent_names: HashMap<i64, Option<String>> = HashMap::new();
    let mut room_names: HashMap<i64, Option<String>> = HashMap::new();
    for item in &items {
        if !parent_names.contains_key(&item.parent_item_id) {
            let name = store
                .find_parent_item(item.parent_item_id)
                .await?
                .map(|parent| parent.name);
            parent_names.insert(item.parent_item_id, name);
        }
        if let Some(room_id) = item.room_id {
            if !room_names.contains_key(&room_id) {
                let name = store.find_room(room_id).await?.map(|room| room.name);
                room_names.insert(room_id, name);
            }
        }
    }

    Ok(items
        .into_iter()
        .map(|item| {
            let state = workflow::resolve(&latest.remove(&item.id).unwrap_or_default());
            ItemView {
                parent_name: parent_names.get(&item.parent_item_id).cloned().flatten(),
                room_name: item
                    .room_id
                    .and_then(|room_id| room_names.get(&room_id).cloned().flatten()),
                item,
                state,
            }
        })
        .collect())
}

pub async fn view(store: &dyn Store, item: InventoryItem) -> Result<ItemView, AppError> {
    views(store, vec![item])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("item view missing".to_string()))
}

fn status_filter(query: &ItemListQuery) -> Result<Option<ItemStatus>, AppError> {
    match query.status.as_deref().map(str::trim) {
        None | Some("") | Some("All") | Some("all") => Ok(None),
        Some(raw) => ItemStatus::from_filter(raw).map(Some).ok_or_else(|| {
            AppError::invalid("status", format!("The selected status {raw} is invalid."))
        }),
    }
}

pub async fn list_items(
    store: &dyn Store,
    parent_item_id: i64,
    query: &ItemListQuery,
) -> Result<Vec<ItemView>, AppError> {
    let status = status_filter(query)?;
    let parent = get_parent(store, parent_item_id).await?;
    let items = store
        .list_items(&ItemFilter {
            parent_item_id: Some(parent.id),
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            archived: query.archived,
            ..ItemFilter::default()
        })
        .await?;

    let mut views = views(store, items).await?;
    if let Some(status) = status {
        views.retain(|view| view.state.status == status);
    }
    Ok(views)
}

pub async fn find_item(store: &dyn Store, id: i64) -> Result<InventoryItem, AppError> {
    store
        .find_item(id)
        .await?
        .ok_or_else(|| AppError::not_found("Item", id))
}

pub async fn get_item(store: &dyn Store, id: i64) -> Result<ItemView, AppError> {
    let item = find_item(store, id).await?;
    view(store, item).await
}

pub async fn item_state(store: &dyn Store, id: i64) -> Result<ItemState, AppError> {
    let item = find_item(store, id).await?;
    let latest = store
        .latest_requests(&[item.id])
        .await?
        .remove(&item.id)
        .unwrap_or_default();
    Ok(workflow::resolve(&latest))
}

async fn ensure_unlocked(store: &dyn Store, item: &InventoryItem) -> Result<(), AppError> {
    let state = item_state(store, item.id).await?;
    if state.locked {
        return Err(AppError::Conflict(format!(
            "Item {} is locked ({})",
            item.id, state.label
        )));
    }
    Ok(())
}

async fn ensure_room(store: &dyn Store, room_id: Option<i64>) -> Result<(), AppError> {
    if let Some(room_id) = room_id {
        if store.find_room(room_id).await?.is_none() {
            return Err(AppError::not_found("Room", room_id));
        }
    }
    Ok(())
}

pub async fn create_item(
    store: &dyn Store,
    parent_item_id: i64,
    payload: ItemPayload,
) -> Result<ItemView, AppError> {
    check(
        &payload,
        &[
            ("serial_number", payload.serial_number.as_str()),
            ("brand", payload.brand.as_str()),
        ],
    )?;
    let parent = get_parent(store, parent_item_id).await?;
    ensure_room(store, payload.room_id).await?;

    let item = store
        .insert_item(NewItem {
            parent_item_id: parent.id,
            serial_number: payload.serial_number.trim().to_string(),
            brand: payload.brand.trim().to_string(),
            room_id: payload.room_id,
            remarks: optional_text(payload.remarks),
        })
        .await?;
    info!("Created item {} ({})", item.id, item.serial_number);
    view(store, item).await
}

/// Updates an item. An omitted `room_id` keeps the current room, and placing a stock item
/// is refused while it is locked in a workflow.
pub async fn update_item(
    store: &dyn Store,
    id: i64,
    payload: ItemPayload,
) -> Result<ItemView, AppError> {
    check(
        &payload,
        &[
            ("serial_number", payload.serial_number.as_str()),
            ("brand", payload.brand.as_str()),
        ],
    )?;
    let item = find_item(store, id).await?;
    ensure_room(store, payload.room_id).await?;
    let room_id = placement(item.room_id, payload.room_id, |current| {
        AppError::Conflict(format!(
            "Item {} is already allocated to room {}",
            item.id, current
        ))
    })?;
    if room_id != item.room_id {
        ensure_unlocked(store, &item).await?;
    }

    let item = store
        .update_item(
            id,
            ItemChanges {
                serial_number: payload.serial_number.trim().to_string(),
                brand: payload.brand.trim().to_string(),
                room_id,
                remarks: optional_text(payload.remarks),
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("Item", id))?;
    view(store, item).await
}

pub async fn archive_item(store: &dyn Store, id: i64) -> Result<(), AppError> {
    let item = find_item(store, id).await?;
    ensure_unlocked(store, &item).await?;
    if !store.archive_item(id).await? {
        return Err(AppError::not_found("Item", id));
    }
    info!("Archived item {}", id);
    Ok(())
}

/// Places an in-stock item in a room.
pub async fn allocate_item(
    store: &dyn Store,
    id: i64,
    payload: ItemRoomAllocation,
) -> Result<ItemView, AppError> {
    check(&payload, &[])?;
    let room_id = payload
        .room_id
        .ok_or_else(|| AppError::invalid("room_id", "The room id field is required."))?;

    let item = find_item(store, id).await?;
    ensure_room(store, Some(room_id)).await?;

    match item.room_id {
        Some(current) if current == room_id => view(store, item).await,
        Some(current) => Err(AppError::Conflict(format!(
            "Item {} is already allocated to room {}",
            item.id, current
        ))),
        None => {
            ensure_unlocked(store, &item).await?;
            let item = store
                .set_item_room(id, Some(room_id))
                .await?
                .ok_or_else(|| AppError::not_found("Item", id))?;
            info!("Allocated item {} to room {}", id, room_id);
            view(store, item).await
        }
    }
}

/// Returns an item to stock.
pub async fn unallocate_item(store: &dyn Store, id: i64) -> Result<ItemView, AppError> {
    let item = find_item(store, id).await?;
    ensure_unlocked(store, &item).await?;
    let item = store
        .set_item_room(id, None)
        .await?
        .ok_or_else(|| AppError::not_found("Item", id))?;
    info!("Returned item {} to stock", id);
    view(store, item).await
}
