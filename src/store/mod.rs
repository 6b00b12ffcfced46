//! Persistence seam. Handlers and services only talk to [`Store`]; `PgStore` backs it with
//! Postgres and `MemoryStore` keeps everything in process.

pub mod memory;
pub mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        Building, InventoryItem, InventoryParentItem, ItemType, LatestRequests, RepairRequest,
        RepairStatus, Role, Room, Session, TransferRequest, TransferStatus, User,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Name search plus the active/archived switch shared by every list.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub search: Option<String>,
    pub archived: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub archived: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RoomFilter {
    pub search: Option<String>,
    pub archived: bool,
    pub building_ids: Option<Vec<i64>>,
    pub unallocated_only: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub parent_item_id: Option<i64>,
    pub room_ids: Option<Vec<i64>>,
    /// Matched against serial number and brand.
    pub search: Option<String>,
    pub archived: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct NewRoom {
    pub name: String,
    pub room_type: String,
    pub building_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewParentItem {
    pub name: String,
    pub item_type: ItemType,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub parent_item_id: i64,
    pub serial_number: String,
    pub brand: String,
    pub room_id: Option<i64>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ItemChanges {
    pub serial_number: String,
    pub brand: String,
    pub room_id: Option<i64>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTransferRequest {
    pub item_id: i64,
    pub destination_room_id: i64,
    pub requestor_id: i64,
    pub details: Option<String>,
    pub file_attachment_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewRepairRequest {
    pub item_id: i64,
    pub requestor_id: i64,
    pub details: String,
    pub file_attachment_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct TransferResolution {
    pub status: TransferStatus,
    pub rejection_details: Option<String>,
    pub resolved_by: i64,
}

#[derive(Debug, Clone)]
pub struct RepairResolution {
    pub status: RepairStatus,
    pub details: Option<String>,
    pub handler_id: i64,
}

/// Row-level persistence operations.
///
/// Lookups by id only see active (non-archived) rows and return `Ok(None)` when nothing
/// matches. Updates return `Ok(None)` for a missing row. Unique-key violations surface as
/// [`AppError::Conflict`].
#[async_trait]
pub trait Store: Send + Sync {
    // Users and sessions
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, AppError>;
    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError>;
    async fn archive_user(&self, id: i64) -> Result<bool, AppError>;

    async fn insert_session(&self, session: Session) -> Result<(), AppError>;
    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, AppError>;
    async fn delete_session(&self, id: Uuid) -> Result<(), AppError>;

    // Buildings
    async fn list_buildings(&self, filter: &ListFilter) -> Result<Vec<Building>, AppError>;
    async fn find_building(&self, id: i64) -> Result<Option<Building>, AppError>;
    async fn insert_building(&self, name: &str) -> Result<Building, AppError>;
    async fn update_building(&self, id: i64, name: &str) -> Result<Option<Building>, AppError>;
    async fn archive_building(&self, id: i64) -> Result<bool, AppError>;
    async fn set_custodian_buildings(
        &self,
        custodian_id: i64,
        building_ids: &[i64],
    ) -> Result<(), AppError>;
    async fn custodian_buildings(&self, custodian_id: i64) -> Result<Vec<Building>, AppError>;

    // Rooms
    async fn list_rooms(&self, filter: &RoomFilter) -> Result<Vec<Room>, AppError>;
    async fn find_room(&self, id: i64) -> Result<Option<Room>, AppError>;
    async fn insert_room(&self, room: NewRoom) -> Result<Room, AppError>;
    async fn update_room(&self, id: i64, room: NewRoom) -> Result<Option<Room>, AppError>;
    async fn set_room_building(
        &self,
        id: i64,
        building_id: Option<i64>,
    ) -> Result<Option<Room>, AppError>;
    async fn archive_room(&self, id: i64) -> Result<bool, AppError>;

    // Inventory parent items
    async fn list_parent_items(
        &self,
        filter: &ListFilter,
    ) -> Result<Vec<InventoryParentItem>, AppError>;
    async fn find_parent_item(&self, id: i64) -> Result<Option<InventoryParentItem>, AppError>;
    async fn insert_parent_item(&self, item: NewParentItem) -> Result<InventoryParentItem, AppError>;
    async fn update_parent_item(
        &self,
        id: i64,
        item: NewParentItem,
    ) -> Result<Option<InventoryParentItem>, AppError>;
    async fn archive_parent_item(&self, id: i64) -> Result<bool, AppError>;

    // Inventory items
    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<InventoryItem>, AppError>;
    async fn find_item(&self, id: i64) -> Result<Option<InventoryItem>, AppError>;
    async fn insert_item(&self, item: NewItem) -> Result<InventoryItem, AppError>;
    async fn update_item(
        &self,
        id: i64,
        changes: ItemChanges,
    ) -> Result<Option<InventoryItem>, AppError>;
    async fn set_item_room(
        &self,
        id: i64,
        room_id: Option<i64>,
    ) -> Result<Option<InventoryItem>, AppError>;
    async fn archive_item(&self, id: i64) -> Result<bool, AppError>;

    // Requests
    async fn latest_requests(
        &self,
        item_ids: &[i64],
    ) -> Result<HashMap<i64, LatestRequests>, AppError>;
    async fn item_transfer_requests(&self, item_id: i64) -> Result<Vec<TransferRequest>, AppError>;
    async fn item_repair_requests(&self, item_id: i64) -> Result<Vec<RepairRequest>, AppError>;

    /// Inserts a pending transfer request unless the item is locked. The lock check and the
    /// insert happen atomically with respect to other submissions for the same item.
    async fn create_transfer_request(
        &self,
        request: NewTransferRequest,
    ) -> Result<TransferRequest, AppError>;
    /// Same guarantee as [`Store::create_transfer_request`].
    async fn create_repair_request(
        &self,
        request: NewRepairRequest,
    ) -> Result<RepairRequest, AppError>;

    async fn list_transfer_requests(
        &self,
        status: Option<TransferStatus>,
    ) -> Result<Vec<TransferRequest>, AppError>;
    async fn find_transfer_request(&self, id: i64) -> Result<Option<TransferRequest>, AppError>;
    async fn list_repair_requests(
        &self,
        status: Option<RepairStatus>,
    ) -> Result<Vec<RepairRequest>, AppError>;
    async fn find_repair_request(&self, id: i64) -> Result<Option<RepairRequest>, AppError>;

    /// Applies a decision to a transfer request. Approval moves the item to the destination
    /// room in the same unit of work.
    async fn resolve_transfer_request(
        &self,
        id: i64,
        resolution: TransferResolution,
    ) -> Result<TransferRequest, AppError>;
    async fn resolve_repair_request(
        &self,
        id: i64,
        resolution: RepairResolution,
    ) -> Result<RepairRequest, AppError>;

    /// Deletes every row. Only used by the development seed.
    async fn truncate_all(&self) -> Result<(), AppError>;
}
