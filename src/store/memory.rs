use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ItemChanges, ItemFilter, ListFilter, NewItem, NewParentItem, NewRepairRequest, NewRoom,
    NewTransferRequest, NewUser, RepairResolution, RoomFilter, Store, TransferResolution,
    UserChanges, UserFilter,
};
use crate::{
    error::AppError,
    models::{
        matches_search, Building, InventoryItem, InventoryParentItem, LatestRequests,
        RepairRequest, RepairStatus, Room, Session, TransferRequest, TransferStatus, User,
    },
    workflow,
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    sessions: HashMap<Uuid, Session>,
    buildings: BTreeMap<i64, Building>,
    custodian_buildings: BTreeMap<i64, Vec<i64>>,
    rooms: BTreeMap<i64, Room>,
    parent_items: BTreeMap<i64, InventoryParentItem>,
    items: BTreeMap<i64, InventoryItem>,
    transfers: BTreeMap<i64, TransferRequest>,
    repairs: BTreeMap<i64, RepairRequest>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn latest_for(&self, item_id: i64) -> LatestRequests {
        let mut latest = LatestRequests::default();
        for transfer in self.transfers.values().filter(|t| t.item_id == item_id) {
            latest.offer_transfer(transfer);
        }
        for repair in self.repairs.values().filter(|r| r.item_id == item_id) {
            latest.offer_repair(repair);
        }
        latest
    }

    fn ensure_unlocked(&self, item_id: i64) -> Result<&InventoryItem, AppError> {
        let item = self
            .items
            .get(&item_id)
            .filter(|item| item.archived_at.is_none())
            .ok_or_else(|| AppError::not_found("Item", item_id))?;
        let state = workflow::resolve(&self.latest_for(item_id));
        if state.locked {
            return Err(AppError::Conflict(format!(
                "Item {} is locked ({})",
                item_id, state.label
            )));
        }
        Ok(item)
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
    }

    fn building_name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.buildings
            .values()
            .any(|b| b.archived_at.is_none() && Some(b.id) != except && b.name == name)
    }

    fn serial_taken(&self, serial: &str, except: Option<i64>) -> bool {
        self.items
            .values()
            .any(|i| Some(i.id) != except && i.serial_number == serial)
    }
}

fn active<T>(row: Option<&T>, archived_at: impl Fn(&T) -> Option<DateTime<Utc>>) -> Option<&T> {
    row.filter(|row| archived_at(row).is_none())
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, i64)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

/// In-process [`Store`] used by tests and `STORAGE=memory` runs. A single lock guards all
/// tables, so every operation is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&user.email, None) {
            return Err(AppError::Conflict(format!(
                "The email {} has already been taken.",
                user.email
            )));
        }
        let now = Utc::now();
        let user = User {
            id: tables.next_id(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
            archived_at: None,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(active(tables.users.get(&id), |u| u.archived_at).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.archived_at.is_none() && u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        let tables = self.tables.read().await;
        let search = filter.search.as_deref();
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| u.archived_at.is_some() == filter.archived)
            .filter(|u| matches_search(&u.name, search) || matches_search(&u.email, search))
            .filter(|u| filter.role.map_or(true, |role| u.role == role))
            .cloned()
            .collect();
        users.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(users)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&changes.email, Some(id)) {
            return Err(AppError::Conflict(format!(
                "The email {} has already been taken.",
                changes.email
            )));
        }
        let Some(user) = tables
            .users
            .get_mut(&id)
            .filter(|u| u.archived_at.is_none())
        else {
            return Ok(None);
        };
        user.name = changes.name;
        user.email = changes.email;
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        user.role = changes.role;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn archive_user(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let archived = match tables.users.get_mut(&id) {
            Some(user) if user.archived_at.is_none() => {
                let now = Utc::now();
                user.archived_at = Some(now);
                user.updated_at = now;
                true
            }
            _ => false,
        };
        tables.sessions.retain(|_, s| s.user_id != id);
        Ok(archived)
    }

    async fn insert_session(&self, session: Session) -> Result<(), AppError> {
        self.tables
            .write()
            .await
            .sessions
            .insert(session.id, session);
        Ok(())
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, AppError> {
        Ok(self.tables.read().await.sessions.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> Result<(), AppError> {
        self.tables.write().await.sessions.remove(&id);
        Ok(())
    }

    async fn list_buildings(&self, filter: &ListFilter) -> Result<Vec<Building>, AppError> {
        let tables = self.tables.read().await;
        let mut buildings: Vec<Building> = tables
            .buildings
            .values()
            .filter(|b| b.archived_at.is_some() == filter.archived)
            .filter(|b| matches_search(&b.name, filter.search.as_deref()))
            .cloned()
            .collect();
        buildings.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(buildings)
    }

    async fn find_building(&self, id: i64) -> Result<Option<Building>, AppError> {
        let tables = self.tables.read().await;
        Ok(active(tables.buildings.get(&id), |b| b.archived_at).cloned())
    }

    async fn insert_building(&self, name: &str) -> Result<Building, AppError> {
        let mut tables = self.tables.write().await;
        if tables.building_name_taken(name, None) {
            return Err(AppError::Conflict(format!("Building {name} already exists")));
        }
        let now = Utc::now();
        let building = Building {
            id: tables.next_id(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            archived_at: None,
        };
        tables.buildings.insert(building.id, building.clone());
        Ok(building)
    }

    async fn update_building(&self, id: i64, name: &str) -> Result<Option<Building>, AppError> {
        let mut tables = self.tables.write().await;
        if tables.building_name_taken(name, Some(id)) {
            return Err(AppError::Conflict(format!("Building {name} already exists")));
        }
        let Some(building) = tables
            .buildings
            .get_mut(&id)
            .filter(|b| b.archived_at.is_none())
        else {
            return Ok(None);
        };
        building.name = name.to_string();
        building.updated_at = Utc::now();
        Ok(Some(building.clone()))
    }

    async fn archive_building(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.buildings.get_mut(&id) {
            Some(building) if building.archived_at.is_none() => {
                let now = Utc::now();
                building.archived_at = Some(now);
                building.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_custodian_buildings(
        &self,
        custodian_id: i64,
        building_ids: &[i64],
    ) -> Result<(), AppError> {
        let mut ids = building_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        self.tables
            .write()
            .await
            .custodian_buildings
            .insert(custodian_id, ids);
        Ok(())
    }

    async fn custodian_buildings(&self, custodian_id: i64) -> Result<Vec<Building>, AppError> {
        let tables = self.tables.read().await;
        let mut buildings: Vec<Building> = tables
            .custodian_buildings
            .get(&custodian_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| active(tables.buildings.get(id), |b| b.archived_at))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        buildings.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(buildings)
    }

    async fn list_rooms(&self, filter: &RoomFilter) -> Result<Vec<Room>, AppError> {
        let tables = self.tables.read().await;
        let mut rooms: Vec<Room> = tables
            .rooms
            .values()
            .filter(|r| r.archived_at.is_some() == filter.archived)
            .filter(|r| matches_search(&r.name, filter.search.as_deref()))
            .filter(|r| match (&filter.building_ids, r.building_id) {
                (Some(ids), Some(building_id)) => ids.contains(&building_id),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .filter(|r| !filter.unallocated_only || !r.is_allocated())
            .cloned()
            .collect();
        rooms.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(rooms)
    }

    async fn find_room(&self, id: i64) -> Result<Option<Room>, AppError> {
        let tables = self.tables.read().await;
        Ok(active(tables.rooms.get(&id), |r| r.archived_at).cloned())
    }

    async fn insert_room(&self, room: NewRoom) -> Result<Room, AppError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let room = Room {
            id: tables.next_id(),
            name: room.name,
            room_type: room.room_type,
            building_id: room.building_id,
            created_at: now,
            updated_at: now,
            archived_at: None,
        };
        tables.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn update_room(&self, id: i64, changes: NewRoom) -> Result<Option<Room>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(room) = tables.rooms.get_mut(&id).filter(|r| r.archived_at.is_none()) else {
            return Ok(None);
        };
        room.name = changes.name;
        room.room_type = changes.room_type;
        room.building_id = changes.building_id;
        room.updated_at = Utc::now();
        Ok(Some(room.clone()))
    }

    async fn set_room_building(
        &self,
        id: i64,
        building_id: Option<i64>,
    ) -> Result<Option<Room>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(room) = tables.rooms.get_mut(&id).filter(|r| r.archived_at.is_none()) else {
            return Ok(None);
        };
        room.building_id = building_id;
        room.updated_at = Utc::now();
        Ok(Some(room.clone()))
    }

    async fn archive_room(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.rooms.get_mut(&id) {
            Some(room) if room.archived_at.is_none() => {
                let now = Utc::now();
                room.archived_at = Some(now);
                room.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_parent_items(
        &self,
        filter: &ListFilter,
    ) -> Result<Vec<InventoryParentItem>, AppError> {
        let tables = self.tables.read().await;
        let mut items: Vec<InventoryParentItem> = tables
            .parent_items
            .values()
            .filter(|p| p.archived_at.is_some() == filter.archived)
            .filter(|p| matches_search(&p.name, filter.search.as_deref()))
            .cloned()
            .collect();
        items.sort_by(|a, b| (&a.name, a.id).cmp(&(&b.name, b.id)));
        Ok(items)
    }

    async fn find_parent_item(&self, id: i64) -> Result<Option<InventoryParentItem>, AppError> {
        let tables = self.tables.read().await;
        Ok(active(tables.parent_items.get(&id), |p| p.archived_at).cloned())
    }

    async fn insert_parent_item(&self, item: NewParentItem) -> Result<InventoryParentItem, AppError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let item = InventoryParentItem {
            id: tables.next_id(),
            name: item.name,
            item_type: item.item_type,
            description: item.description,
            created_at: now,
            updated_at: now,
            archived_at: None,
        };
        tables.parent_items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_parent_item(
        &self,
        id: i64,
        changes: NewParentItem,
    ) -> Result<Option<InventoryParentItem>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables
            .parent_items
            .get_mut(&id)
            .filter(|p| p.archived_at.is_none())
        else {
            return Ok(None);
        };
        item.name = changes.name;
        item.item_type = changes.item_type;
        item.description = changes.description;
        item.updated_at = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn archive_parent_item(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.parent_items.get_mut(&id) {
            Some(item) if item.archived_at.is_none() => {
                let now = Utc::now();
                item.archived_at = Some(now);
                item.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<InventoryItem>, AppError> {
        let tables = self.tables.read().await;
        let search = filter.search.as_deref();
        let mut items: Vec<InventoryItem> = tables
            .items
            .values()
            .filter(|i| i.archived_at.is_some() == filter.archived)
            .filter(|i| filter.parent_item_id.map_or(true, |p| i.parent_item_id == p))
            .filter(|i| match (&filter.room_ids, i.room_id) {
                (Some(ids), Some(room_id)) => ids.contains(&room_id),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .filter(|i| matches_search(&i.serial_number, search) || matches_search(&i.brand, search))
            .cloned()
            .collect();
        newest_first(&mut items, |i| (i.created_at, i.id));
        Ok(items)
    }

    async fn find_item(&self, id: i64) -> Result<Option<InventoryItem>, AppError> {
        let tables = self.tables.read().await;
        Ok(active(tables.items.get(&id), |i| i.archived_at).cloned())
    }

    async fn insert_item(&self, item: NewItem) -> Result<InventoryItem, AppError> {
        let mut tables = self.tables.write().await;
        if tables.serial_taken(&item.serial_number, None) {
            return Err(AppError::Conflict(format!(
                "Serial number {} is already registered",
                item.serial_number
            )));
        }
        let now = Utc::now();
        let item = InventoryItem {
            id: tables.next_id(),
            parent_item_id: item.parent_item_id,
            serial_number: item.serial_number,
            brand: item.brand,
            room_id: item.room_id,
            remarks: item.remarks,
            created_at: now,
            updated_at: now,
            archived_at: None,
        };
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_item(
        &self,
        id: i64,
        changes: ItemChanges,
    ) -> Result<Option<InventoryItem>, AppError> {
        let mut tables = self.tables.write().await;
        if tables.serial_taken(&changes.serial_number, Some(id)) {
            return Err(AppError::Conflict(format!(
                "Serial number {} is already registered",
                changes.serial_number
            )));
        }
        let Some(item) = tables.items.get_mut(&id).filter(|i| i.archived_at.is_none()) else {
            return Ok(None);
        };
        item.serial_number = changes.serial_number;
        item.brand = changes.brand;
        item.room_id = changes.room_id;
        item.remarks = changes.remarks;
        item.updated_at = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn set_item_room(
        &self,
        id: i64,
        room_id: Option<i64>,
    ) -> Result<Option<InventoryItem>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(item) = tables.items.get_mut(&id).filter(|i| i.archived_at.is_none()) else {
            return Ok(None);
        };
        item.room_id = room_id;
        item.updated_at = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn archive_item(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables.items.get_mut(&id) {
            Some(item) if item.archived_at.is_none() => {
                let now = Utc::now();
                item.archived_at = Some(now);
                item.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn latest_requests(
        &self,
        item_ids: &[i64],
    ) -> Result<HashMap<i64, LatestRequests>, AppError> {
        let tables = self.tables.read().await;
        Ok(item_ids
            .iter()
            .map(|id| (*id, tables.latest_for(*id)))
            .filter(|(_, latest)| latest.transfer.is_some() || latest.repair.is_some())
            .collect())
    }

    async fn item_transfer_requests(&self, item_id: i64) -> Result<Vec<TransferRequest>, AppError> {
        let tables = self.tables.read().await;
        let mut requests: Vec<TransferRequest> = tables
            .transfers
            .values()
            .filter(|t| t.item_id == item_id)
            .cloned()
            .collect();
        newest_first(&mut requests, |t| (t.created_at, t.id));
        Ok(requests)
    }

    async fn item_repair_requests(&self, item_id: i64) -> Result<Vec<RepairRequest>, AppError> {
        let tables = self.tables.read().await;
        let mut requests: Vec<RepairRequest> = tables
            .repairs
            .values()
            .filter(|r| r.item_id == item_id)
            .cloned()
            .collect();
        newest_first(&mut requests, |r| (r.created_at, r.id));
        Ok(requests)
    }

    async fn create_transfer_request(
        &self,
        request: NewTransferRequest,
    ) -> Result<TransferRequest, AppError> {
        let mut tables = self.tables.write().await;
        let current_room_id = tables.ensure_unlocked(request.item_id)?.room_id;
        let now = Utc::now();
        let created = TransferRequest {
            id: tables.next_id(),
            item_id: request.item_id,
            current_room_id,
            destination_room_id: request.destination_room_id,
            requestor_id: request.requestor_id,
            status: TransferStatus::Pending,
            details: request.details,
            rejection_details: None,
            file_attachment_id: request.file_attachment_id,
            resolved_by: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.transfers.insert(created.id, created.clone());
        Ok(created)
    }

    async fn create_repair_request(
        &self,
        request: NewRepairRequest,
    ) -> Result<RepairRequest, AppError> {
        let mut tables = self.tables.write().await;
        tables.ensure_unlocked(request.item_id)?;
        let now = Utc::now();
        let created = RepairRequest {
            id: tables.next_id(),
            item_id: request.item_id,
            requestor_id: request.requestor_id,
            status: RepairStatus::Pending,
            details: request.details,
            handler_id: None,
            file_attachment_id: request.file_attachment_id,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.repairs.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_transfer_requests(
        &self,
        status: Option<TransferStatus>,
    ) -> Result<Vec<TransferRequest>, AppError> {
        let tables = self.tables.read().await;
        let mut requests: Vec<TransferRequest> = tables
            .transfers
            .values()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .cloned()
            .collect();
        newest_first(&mut requests, |t| (t.created_at, t.id));
        Ok(requests)
    }

    async fn find_transfer_request(&self, id: i64) -> Result<Option<TransferRequest>, AppError> {
        Ok(self.tables.read().await.transfers.get(&id).cloned())
    }

    async fn list_repair_requests(
        &self,
        status: Option<RepairStatus>,
    ) -> Result<Vec<RepairRequest>, AppError> {
        let tables = self.tables.read().await;
        let mut requests: Vec<RepairRequest> = tables
            .repairs
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        newest_first(&mut requests, |r| (r.created_at, r.id));
        Ok(requests)
    }

    async fn find_repair_request(&self, id: i64) -> Result<Option<RepairRequest>, AppError> {
        Ok(self.tables.read().await.repairs.get(&id).cloned())
    }

    async fn resolve_transfer_request(
        &self,
        id: i64,
        resolution: TransferResolution,
    ) -> Result<TransferRequest, AppError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let current = tables
            .transfers
            .get(&id)
            .ok_or_else(|| AppError::not_found("Transfer request", id))?;
        workflow::check_transfer_transition(current.status, resolution.status)?;
        if resolution.status == TransferStatus::Approved {
            let destination = current.destination_room_id;
            let room = tables.rooms.get(&destination);
            if !room.is_some_and(|room| room.archived_at.is_none()) {
                return Err(AppError::not_found("Room", destination));
            }
        }

        let Some(request) = tables.transfers.get_mut(&id) else {
            return Err(AppError::not_found("Transfer request", id));
        };
        request.status = resolution.status;
        request.rejection_details = resolution.rejection_details;
        request.resolved_by = Some(resolution.resolved_by);
        request.resolved_at = Some(now);
        request.updated_at = now;
        let updated = request.clone();

        if updated.status == TransferStatus::Approved {
            if let Some(item) = tables.items.get_mut(&updated.item_id) {
                item.room_id = Some(updated.destination_room_id);
                item.updated_at = now;
            }
        }
        Ok(updated)
    }

    async fn resolve_repair_request(
        &self,
        id: i64,
        resolution: RepairResolution,
    ) -> Result<RepairRequest, AppError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let current = tables
            .repairs
            .get(&id)
            .ok_or_else(|| AppError::not_found("Repair request", id))?;
        workflow::check_repair_transition(current.status, resolution.status)?;
        workflow::check_repair_is_current(id, &tables.latest_for(current.item_id))?;

        let Some(request) = tables.repairs.get_mut(&id) else {
            return Err(AppError::not_found("Repair request", id));
        };
        request.status = resolution.status;
        if let Some(details) = resolution.details {
            request.details = details;
        }
        request.handler_id = Some(resolution.handler_id);
        request.resolved_at = Some(now);
        request.updated_at = now;
        Ok(request.clone())
    }

    async fn truncate_all(&self) -> Result<(), AppError> {
        *self.tables.write().await = Tables::default();
        Ok(())
    }
}
