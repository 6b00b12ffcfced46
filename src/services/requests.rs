use log::info;
use serde::Serialize;

use super::{check, inventory, optional_text};
use crate::{
    error::AppError,
    middleware::CurrentUser,
    models::{
        RepairRequest, RepairRequestPayload, RepairStatus, RequestListQuery,
        ResolveRepairPayload, ResolveTransferPayload, Role, TransferRequest,
        TransferRequestPayload, TransferStatus,
    },
    store::{NewRepairRequest, NewTransferRequest, RepairResolution, Store, TransferResolution},
};

/// Every request ever filed against one item, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct ItemHistory {
    pub item_id: i64,
    pub transfers: Vec<TransferRequest>,
    pub repairs: Vec<RepairRequest>,
}

fn parse_status<T: std::str::FromStr>(raw: Option<&str>) -> Result<Option<T>, AppError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            AppError::invalid("status", format!("The selected status {raw} is invalid."))
        }),
    }
}

/// Files a transfer of `item_id` to another room on behalf of `actor`.
pub async fn submit_transfer(
    store: &dyn Store,
    actor: &CurrentUser,
    item_id: i64,
    payload: TransferRequestPayload,
) -> Result<TransferRequest, AppError> {
    check(&payload, &[])?;
    let destination_room_id = payload.destination_room_id.ok_or_else(|| {
        AppError::invalid(
            "destination_room_id",
            "The destination room id field is required.",
        )
    })?;

    let item = inventory::find_item(store, item_id).await?;
    if store.find_room(destination_room_id).await?.is_none() {
        return Err(AppError::not_found("Room", destination_room_id));
    }
    if item.room_id == Some(destination_room_id) {
        return Err(AppError::invalid(
            "destination_room_id",
            "The destination room must differ from the current room.",
        ));
    }

    let request = store
        .create_transfer_request(NewTransferRequest {
            item_id: item.id,
            destination_room_id,
            requestor_id: actor.id,
            details: optional_text(payload.details),
            file_attachment_id: payload.file_attachment_id,
        })
        .await?;
    info!(
        "User {} requested transfer {} of item {} to room {}",
        actor.id, request.id, item.id, destination_room_id
    );
    Ok(request)
}

pub async fn submit_repair(
    store: &dyn Store,
    actor: &CurrentUser,
    item_id: i64,
    payload: RepairRequestPayload,
) -> Result<RepairRequest, AppError> {
    check(&payload, &[("details", payload.details.as_str())])?;
    let item = inventory::find_item(store, item_id).await?;

    let request = store
        .create_repair_request(NewRepairRequest {
            item_id: item.id,
            requestor_id: actor.id,
            details: payload.details.trim().to_string(),
            file_attachment_id: payload.file_attachment_id,
        })
        .await?;
    info!(
        "User {} requested repair {} of item {}",
        actor.id, request.id, item.id
    );
    Ok(request)
}

/// Approves or rejects a pending transfer. Approval moves the item to the destination room.
pub async fn resolve_transfer(
    store: &dyn Store,
    actor: &CurrentUser,
    request_id: i64,
    payload: ResolveTransferPayload,
) -> Result<TransferRequest, AppError> {
    actor.require_admin()?;
    check(&payload, &[])?;
    let decision = payload
        .decision
        .ok_or_else(|| AppError::invalid("decision", "The decision field is required."))?;
    let rejection_details = optional_text(payload.rejection_details);

    match decision {
        TransferStatus::Pending => {
            return Err(AppError::invalid(
                "decision",
                "The decision must be approved or rejected.",
            ))
        }
        TransferStatus::Rejected if rejection_details.is_none() => {
            return Err(AppError::invalid(
                "rejection_details",
                "The rejection details field is required when rejecting.",
            ))
        }
        _ => {}
    }

    let request = store
        .resolve_transfer_request(
            request_id,
            TransferResolution {
                status: decision,
                rejection_details,
                resolved_by: actor.id,
            },
        )
        .await?;
    info!(
        "User {} marked transfer {} as {}",
        actor.id, request.id, request.status
    );
    Ok(request)
}

pub async fn resolve_repair(
    store: &dyn Store,
    actor: &CurrentUser,
    request_id: i64,
    payload: ResolveRepairPayload,
) -> Result<RepairRequest, AppError> {
    actor.require(&[Role::Worker])?;
    check(&payload, &[])?;
    let status = payload
        .status
        .ok_or_else(|| AppError::invalid("status", "The status field is required."))?;

    let request = store
        .resolve_repair_request(
            request_id,
            RepairResolution {
                status,
                details: optional_text(payload.details),
                handler_id: actor.id,
            },
        )
        .await?;
    info!(
        "User {} marked repair {} as {}",
        actor.id,
        request.id,
        request.status.label()
    );
    Ok(request)
}

pub async fn list_transfers(
    store: &dyn Store,
    query: &RequestListQuery,
) -> Result<Vec<TransferRequest>, AppError> {
    let status: Option<TransferStatus> = parse_status(query.status.as_deref())?;
    store.list_transfer_requests(status).await
}

pub async fn list_repairs(
    store: &dyn Store,
    query: &RequestListQuery,
) -> Result<Vec<RepairRequest>, AppError> {
    let status: Option<RepairStatus> = parse_status(query.status.as_deref())?;
    store.list_repair_requests(status).await
}

pub async fn get_transfer(store: &dyn Store, id: i64) -> Result<TransferRequest, AppError> {
    store
        .find_transfer_request(id)
        .await?
        .ok_or_else(|| AppError::not_found("Transfer request", id))
}

pub async fn get_repair(store: &dyn Store, id: i64) -> Result<RepairRequest, AppError> {
    store
        .find_repair_request(id)
        .await?
        .ok_or_else(|| AppError::not_found("Repair request", id))
}

pub async fn item_history(store: &dyn Store, item_id: i64) -> Result<ItemHistory, AppError> {
    let item = inventory::find_item(store, item_id).await?;
    Ok(ItemHistory {
        item_id: item.id,
        transfers: store.item_transfer_requests(item.id).await?,
        repairs: store.item_repair_requests(item.id).await?,
    })
}
