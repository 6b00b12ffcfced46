use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{
    ItemChanges, ItemFilter, ListFilter, NewItem, NewParentItem, NewRepairRequest, NewRoom,
    NewTransferRequest, NewUser, RepairResolution, RoomFilter, Store, TransferResolution,
    UserChanges, UserFilter,
};
use crate::{
    database::Database,
    error::AppError,
    models::{
        Building, InventoryItem, InventoryParentItem, LatestRequests, RepairRequest, RepairStatus,
        Room, Session, TransferRequest, TransferStatus, User,
    },
    workflow,
};

/// [`Store`] backed by a Postgres pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Database,
}

impl PgStore {
    pub fn new(pool: Database) -> Self {
        Self { pool }
    }
}

fn conflict_on_unique(err: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message())
        }
        _ => AppError::Database(err),
    }
}

async fn latest_in(
    conn: &mut PgConnection,
    item_ids: &[i64],
) -> Result<HashMap<i64, LatestRequests>, sqlx::Error> {
    let mut latest: HashMap<i64, LatestRequests> = HashMap::new();

    let transfers = sqlx::query_as::<_, TransferRequest>(
        r#"
        SELECT DISTINCT ON (item_id) *
        FROM transfer_requests
        WHERE item_id = ANY($1)
        ORDER BY item_id, created_at DESC, id DESC
        "#,
    )
    .bind(item_ids)
    .fetch_all(&mut *conn)
    .await?;
    for transfer in transfers {
        let item_id = transfer.item_id;
        latest.entry(item_id).or_default().transfer = Some(transfer);
    }

    let repairs = sqlx::query_as::<_, RepairRequest>(
        r#"
        SELECT DISTINCT ON (item_id) *
        FROM repair_requests
        WHERE item_id = ANY($1)
        ORDER BY item_id, created_at DESC, id DESC
        "#,
    )
    .bind(item_ids)
    .fetch_all(&mut *conn)
    .await?;
    for repair in repairs {
        let item_id = repair.item_id;
        latest.entry(item_id).or_default().repair = Some(repair);
    }

    Ok(latest)
}

/// Locks the item row for the rest of the transaction and fails when it is missing or
/// already part of an open workflow.
async fn lock_unlocked_item(conn: &mut PgConnection, item_id: i64) -> Result<(), AppError> {
    let item = sqlx::query_as::<_, InventoryItem>(
        "SELECT * FROM inventory_items WHERE id = $1 AND archived_at IS NULL FOR UPDATE",
    )
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::not_found("Item", item_id))?;

    let latest = latest_in(conn, &[item.id])
        .await?
        .remove(&item.id)
        .unwrap_or_default();
    let state = workflow::resolve(&latest);
    if state.locked {
        return Err(AppError::Conflict(format!(
            "Item {} is locked ({})",
            item.id, state.label
        )));
    }
    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let email = user.email.clone();
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("The email {email} has already been taken.")))
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1) AND archived_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE (archived_at IS NOT NULL) = $1
              AND ($2::TEXT IS NULL OR name ILIKE '%' || $2 || '%' OR email ILIKE '%' || $2 || '%')
              AND ($3::TEXT IS NULL OR role = $3)
            ORDER BY name, id
            "#,
        )
        .bind(filter.archived)
        .bind(filter.search.as_deref())
        .bind(filter.role.map(|role| role.to_string()))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> Result<Option<User>, AppError> {
        let email = changes.email.clone();
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = COALESCE($4, password_hash), role = $5,
                updated_at = NOW()
            WHERE id = $1 AND archived_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(changes.password_hash.as_deref())
        .bind(changes.role.as_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("The email {email} has already been taken.")))
    }

    async fn archive_user(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE users SET archived_at = NOW(), updated_at = NOW() WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_session(&self, session: Session) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, expires_at, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(session)
    }

    async fn delete_session(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_buildings(&self, filter: &ListFilter) -> Result<Vec<Building>, AppError> {
        let buildings = sqlx::query_as::<_, Building>(
            r#"
            SELECT * FROM buildings
            WHERE (archived_at IS NOT NULL) = $1
              AND ($2::TEXT IS NULL OR name ILIKE '%' || $2 || '%')
            ORDER BY name, id
            "#,
        )
        .bind(filter.archived)
        .bind(filter.search.as_deref())
        .fetch_all(&self.pool)
        .await?;
        Ok(buildings)
    }

    async fn find_building(&self, id: i64) -> Result<Option<Building>, AppError> {
        let building = sqlx::query_as::<_, Building>(
            "SELECT * FROM buildings WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(building)
    }

    async fn insert_building(&self, name: &str) -> Result<Building, AppError> {
        sqlx::query_as::<_, Building>("INSERT INTO buildings (name) VALUES ($1) RETURNING *")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, || format!("Building {name} already exists")))
    }

    async fn update_building(&self, id: i64, name: &str) -> Result<Option<Building>, AppError> {
        sqlx::query_as::<_, Building>(
            r#"
            UPDATE buildings SET name = $2, updated_at = NOW()
            WHERE id = $1 AND archived_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("Building {name} already exists")))
    }

    async fn archive_building(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE buildings SET archived_at = NOW(), updated_at = NOW() WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_custodian_buildings(
        &self,
        custodian_id: i64,
        building_ids: &[i64],
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM custodian_building WHERE custodian_id = $1")
            .bind(custodian_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO custodian_building (custodian_id, building_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(custodian_id)
        .bind(building_ids)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn custodian_buildings(&self, custodian_id: i64) -> Result<Vec<Building>, AppError> {
        let buildings = sqlx::query_as::<_, Building>(
            r#"
            SELECT b.* FROM buildings b
            JOIN custodian_building cb ON cb.building_id = b.id
            WHERE cb.custodian_id = $1 AND b.archived_at IS NULL
            ORDER BY b.name, b.id
            "#,
        )
        .bind(custodian_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(buildings)
    }

    async fn list_rooms(&self, filter: &RoomFilter) -> Result<Vec<Room>, AppError> {
        let rooms = sqlx::query_as::<_, Room>(
            r#"
            SELECT * FROM rooms
            WHERE (archived_at IS NOT NULL) = $1
              AND ($2::TEXT IS NULL OR name ILIKE '%' || $2 || '%')
              AND ($3::BIGINT[] IS NULL OR building_id = ANY($3))
              AND (NOT $4 OR building_id IS NULL)
            ORDER BY name, id
            "#,
        )
        .bind(filter.archived)
        .bind(filter.search.as_deref())
        .bind(filter.building_ids.as_deref())
        .bind(filter.unallocated_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(rooms)
    }

    async fn find_room(&self, id: i64) -> Result<Option<Room>, AppError> {
        let room =
            sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = $1 AND archived_at IS NULL")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(room)
    }

    async fn insert_room(&self, room: NewRoom) -> Result<Room, AppError> {
        let room = sqlx::query_as::<_, Room>(
            "INSERT INTO rooms (name, room_type, building_id) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&room.name)
        .bind(&room.room_type)
        .bind(room.building_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(room)
    }

    async fn update_room(&self, id: i64, room: NewRoom) -> Result<Option<Room>, AppError> {
        let room = sqlx::query_as::<_, Room>(
            r#"
            UPDATE rooms SET name = $2, room_type = $3, building_id = $4, updated_at = NOW()
            WHERE id = $1 AND archived_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&room.name)
        .bind(&room.room_type)
        .bind(room.building_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(room)
    }

    async fn set_room_building(
        &self,
        id: i64,
        building_id: Option<i64>,
    ) -> Result<Option<Room>, AppError> {
        let room = sqlx::query_as::<_, Room>(
            r#"
            UPDATE rooms SET building_id = $2, updated_at = NOW()
            WHERE id = $1 AND archived_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(building_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(room)
    }

    async fn archive_room(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE rooms SET archived_at = NOW(), updated_at = NOW() WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_parent_items(
        &self,
        filter: &ListFilter,
    ) -> Result<Vec<InventoryParentItem>, AppError> {
        let items = sqlx::query_as::<_, InventoryParentItem>(
            r#"
            SELECT * FROM inventory_parent_items
            WHERE (archived_at IS NOT NULL) = $1
              AND ($2::TEXT IS NULL OR name ILIKE '%' || $2 || '%')
            ORDER BY name, id
            "#,
        )
        .bind(filter.archived)
        .bind(filter.search.as_deref())
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn find_parent_item(&self, id: i64) -> Result<Option<InventoryParentItem>, AppError> {
        let item = sqlx::query_as::<_, InventoryParentItem>(
            "SELECT * FROM inventory_parent_items WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn insert_parent_item(&self, item: NewParentItem) -> Result<InventoryParentItem, AppError> {
        let item = sqlx::query_as::<_, InventoryParentItem>(
            r#"
            INSERT INTO inventory_parent_items (name, item_type, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&item.name)
        .bind(item.item_type.as_ref())
        .bind(item.description.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    async fn update_parent_item(
        &self,
        id: i64,
        item: NewParentItem,
    ) -> Result<Option<InventoryParentItem>, AppError> {
        let item = sqlx::query_as::<_, InventoryParentItem>(
            r#"
            UPDATE inventory_parent_items
            SET name = $2, item_type = $3, description = $4, updated_at = NOW()
            WHERE id = $1 AND archived_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&item.name)
        .bind(item.item_type.as_ref())
        .bind(item.description.as_deref())
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn archive_parent_item(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE inventory_parent_items SET archived_at = NOW(), updated_at = NOW() WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<InventoryItem>, AppError> {
        let items = sqlx::query_as::<_, InventoryItem>(
            r#"
            SELECT * FROM inventory_items
            WHERE (archived_at IS NOT NULL) = $1
              AND ($2::BIGINT IS NULL OR parent_item_id = $2)
              AND ($3::BIGINT[] IS NULL OR room_id = ANY($3))
              AND ($4::TEXT IS NULL OR serial_number ILIKE '%' || $4 || '%' OR brand ILIKE '%' || $4 || '%')
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(filter.archived)
        .bind(filter.parent_item_id)
        .bind(filter.room_ids.as_deref())
        .bind(filter.search.as_deref())
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn find_item(&self, id: i64) -> Result<Option<InventoryItem>, AppError> {
        let item = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn insert_item(&self, item: NewItem) -> Result<InventoryItem, AppError> {
        let serial = item.serial_number.clone();
        sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory_items (parent_item_id, serial_number, brand, room_id, remarks)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(item.parent_item_id)
        .bind(&item.serial_number)
        .bind(&item.brand)
        .bind(item.room_id)
        .bind(item.remarks.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("Serial number {serial} is already registered")))
    }

    async fn update_item(
        &self,
        id: i64,
        changes: ItemChanges,
    ) -> Result<Option<InventoryItem>, AppError> {
        let serial = changes.serial_number.clone();
        sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory_items
            SET serial_number = $2, brand = $3, room_id = $4, remarks = $5, updated_at = NOW()
            WHERE id = $1 AND archived_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.serial_number)
        .bind(&changes.brand)
        .bind(changes.room_id)
        .bind(changes.remarks.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("Serial number {serial} is already registered")))
    }

    async fn set_item_room(
        &self,
        id: i64,
        room_id: Option<i64>,
    ) -> Result<Option<InventoryItem>, AppError> {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory_items SET room_id = $2, updated_at = NOW()
            WHERE id = $1 AND archived_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn archive_item(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE inventory_items SET archived_at = NOW(), updated_at = NOW() WHERE id = $1 AND archived_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn latest_requests(
        &self,
        item_ids: &[i64],
    ) -> Result<HashMap<i64, LatestRequests>, AppError> {
        if item_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut conn = self.pool.acquire().await?;
        Ok(latest_in(&mut conn, item_ids).await?)
    }

    async fn item_transfer_requests(&self, item_id: i64) -> Result<Vec<TransferRequest>, AppError> {
        let requests = sqlx::query_as::<_, TransferRequest>(
            "SELECT * FROM transfer_requests WHERE item_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn item_repair_requests(&self, item_id: i64) -> Result<Vec<RepairRequest>, AppError> {
        let requests = sqlx::query_as::<_, RepairRequest>(
            "SELECT * FROM repair_requests WHERE item_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn create_transfer_request(
        &self,
        request: NewTransferRequest,
    ) -> Result<TransferRequest, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_unlocked_item(&mut *tx, request.item_id).await?;

        let created = sqlx::query_as::<_, TransferRequest>(
            r#"
            INSERT INTO transfer_requests
                (item_id, current_room_id, destination_room_id, requestor_id, status, details, file_attachment_id)
            SELECT id, room_id, $2, $3, $4, $5, $6 FROM inventory_items WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(request.item_id)
        .bind(request.destination_room_id)
        .bind(request.requestor_id)
        .bind(TransferStatus::Pending.as_ref())
        .bind(request.details.as_deref())
        .bind(request.file_attachment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn create_repair_request(
        &self,
        request: NewRepairRequest,
    ) -> Result<RepairRequest, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_unlocked_item(&mut *tx, request.item_id).await?;

        let created = sqlx::query_as::<_, RepairRequest>(
            r#"
            INSERT INTO repair_requests (item_id, requestor_id, status, details, file_attachment_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.item_id)
        .bind(request.requestor_id)
        .bind(RepairStatus::Pending.as_ref())
        .bind(&request.details)
        .bind(request.file_attachment_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn list_transfer_requests(
        &self,
        status: Option<TransferStatus>,
    ) -> Result<Vec<TransferRequest>, AppError> {
        let requests = sqlx::query_as::<_, TransferRequest>(
            r#"
            SELECT * FROM transfer_requests
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(status.map(|s| s.to_string()))
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn find_transfer_request(&self, id: i64) -> Result<Option<TransferRequest>, AppError> {
        let request =
            sqlx::query_as::<_, TransferRequest>("SELECT * FROM transfer_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(request)
    }

    async fn list_repair_requests(
        &self,
        status: Option<RepairStatus>,
    ) -> Result<Vec<RepairRequest>, AppError> {
        let requests = sqlx::query_as::<_, RepairRequest>(
            r#"
            SELECT * FROM repair_requests
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(status.map(|s| s.to_string()))
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn find_repair_request(&self, id: i64) -> Result<Option<RepairRequest>, AppError> {
        let request =
            sqlx::query_as::<_, RepairRequest>("SELECT * FROM repair_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(request)
    }

    async fn resolve_transfer_request(
        &self,
        id: i64,
        resolution: TransferResolution,
    ) -> Result<TransferRequest, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, TransferRequest>(
            "SELECT * FROM transfer_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Transfer request", id))?;
        workflow::check_transfer_transition(current.status, resolution.status)?;

        if resolution.status == TransferStatus::Approved {
            sqlx::query_scalar::<_, i64>(
                "SELECT id FROM rooms WHERE id = $1 AND archived_at IS NULL FOR SHARE",
            )
            .bind(current.destination_room_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Room", current.destination_room_id))?;
        }

        let updated = sqlx::query_as::<_, TransferRequest>(
            r#"
            UPDATE transfer_requests
            SET status = $2, rejection_details = $3, resolved_by = $4, resolved_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(resolution.status.as_ref())
        .bind(resolution.rejection_details.as_deref())
        .bind(resolution.resolved_by)
        .fetch_one(&mut *tx)
        .await?;

        if updated.status == TransferStatus::Approved {
            sqlx::query(
                "UPDATE inventory_items SET room_id = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(updated.item_id)
            .bind(updated.destination_room_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    async fn resolve_repair_request(
        &self,
        id: i64,
        resolution: RepairResolution,
    ) -> Result<RepairRequest, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, RepairRequest>(
            "SELECT * FROM repair_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Repair request", id))?;
        workflow::check_repair_transition(current.status, resolution.status)?;

        sqlx::query("SELECT id FROM inventory_items WHERE id = $1 FOR UPDATE")
            .bind(current.item_id)
            .execute(&mut *tx)
            .await?;
        let latest = latest_in(&mut *tx, &[current.item_id])
            .await?
            .remove(&current.item_id)
            .unwrap_or_default();
        workflow::check_repair_is_current(id, &latest)?;

        let updated = sqlx::query_as::<_, RepairRequest>(
            r#"
            UPDATE repair_requests
            SET status = $2, details = COALESCE($3, details), handler_id = $4,
                resolved_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(resolution.status.as_ref())
        .bind(resolution.details.as_deref())
        .bind(resolution.handler_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn truncate_all(&self) -> Result<(), AppError> {
        sqlx::query(
            r#"
            TRUNCATE transfer_requests, repair_requests, inventory_items, inventory_parent_items,
                     custodian_building, rooms, buildings, sessions, users
            RESTART IDENTITY CASCADE
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
