//! Item status derivation and request transition rules.
//!
//! Everything here is pure: callers fetch the latest requests of an item and ask
//! [`resolve`] what the item currently looks like.

use serde::Serialize;
use strum::{EnumIter, EnumString, IntoEnumIterator};

use crate::{
    error::AppError,
    models::{LatestRequests, RepairStatus, TransferStatus},
};

/// The single human-facing status of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, EnumIter)]
#[serde(tag = "kind")]
#[strum(ascii_case_insensitive)]
pub enum ItemStatus {
    Available,
    PendingTransfer,
    PendingRepair,
    Disposed,
}

impl ItemStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ItemStatus::Available => "Available",
            ItemStatus::PendingTransfer => "Pending Transfer",
            ItemStatus::PendingRepair => "Pending Repair",
            ItemStatus::Disposed => "Disposed",
        }
    }

    /// Parses either the variant name (`PendingTransfer`) or the label (`Pending Transfer`).
    pub fn from_filter(raw: &str) -> Option<Self> {
        raw.parse()
            .ok()
            .or_else(|| Self::iter().find(|status| status.label().eq_ignore_ascii_case(raw)))
    }
}

/// Resolved status plus whether the item is barred from entering a new workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ItemState {
    pub status: ItemStatus,
    pub label: &'static str,
    pub locked: bool,
}

impl ItemState {
    fn new(status: ItemStatus, locked: bool) -> Self {
        Self {
            status,
            label: status.label(),
            locked,
        }
    }
}

/// Derives the state of an item from its most recent transfer and repair requests.
///
/// A pending repair wins over a pending transfer when both exist. Nothing prevents the
/// two from coexisting in old data, and the ordering is a policy choice kept in one place.
pub fn resolve(latest: &LatestRequests) -> ItemState {
    let repair = latest.repair.as_ref().map(|r| r.status);
    let transfer = latest.transfer.as_ref().map(|t| t.status);

    if repair == Some(RepairStatus::Pending) {
        ItemState::new(ItemStatus::PendingRepair, true)
    } else if transfer == Some(TransferStatus::Pending) {
        ItemState::new(ItemStatus::PendingTransfer, true)
    } else if repair == Some(RepairStatus::Disposed) {
        ItemState::new(ItemStatus::Disposed, true)
    } else {
        ItemState::new(ItemStatus::Available, false)
    }
}

pub fn check_transfer_transition(from: TransferStatus, to: TransferStatus) -> Result<(), AppError> {
    match (from, to) {
        (TransferStatus::Pending, TransferStatus::Approved | TransferStatus::Rejected) => Ok(()),
        _ => Err(AppError::Conflict(format!(
            "Transfer request cannot move from {from} to {to}"
        ))),
    }
}

pub fn check_repair_transition(from: RepairStatus, to: RepairStatus) -> Result<(), AppError> {
    use RepairStatus::*;

    let allowed = match from {
        Pending => matches!(to, Repaired | PoCreated | Rejected | Disposed),
        PoCreated => matches!(to, Repaired | Disposed),
        Repaired | Rejected | Disposed => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "Repair request cannot move from {} to {}",
            from.label(),
            to.label()
        )))
    }
}

/// Only the item's most recent repair request may be resolved. Older requests are
/// superseded, and letting them change the item's fate would go unseen by [`resolve`].
pub fn check_repair_is_current(request_id: i64, latest: &LatestRequests) -> Result<(), AppError> {
    match &latest.repair {
        Some(current) if current.id != request_id => Err(AppError::Conflict(format!(
            "Repair request {request_id} was superseded by repair request {}",
            current.id
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RepairRequest, TransferRequest};
    use chrono::Utc;

    fn transfer(status: TransferStatus) -> TransferRequest {
        let now = Utc::now();
        TransferRequest {
            id: 1,
            item_id: 1,
            current_room_id: None,
            destination_room_id: 5,
            requestor_id: 1,
            status,
            details: None,
            rejection_details: None,
            file_attachment_id: None,
            resolved_by: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn repair(status: RepairStatus) -> RepairRequest {
        let now = Utc::now();
        RepairRequest {
            id: 1,
            item_id: 1,
            requestor_id: 1,
            status,
            details: "screen flickers".into(),
            handler_id: None,
            file_attachment_id: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn latest(
        transfer_status: Option<TransferStatus>,
        repair_status: Option<RepairStatus>,
    ) -> LatestRequests {
        LatestRequests {
            transfer: transfer_status.map(transfer),
            repair: repair_status.map(repair),
        }
    }

    #[test]
    fn no_requests_means_available() {
        let state = resolve(&LatestRequests::default());
        assert_eq!(state.status, ItemStatus::Available);
        assert!(!state.locked);
    }

    #[test]
    fn pending_repair_locks_regardless_of_transfer() {
        for transfer_status in [
            None,
            Some(TransferStatus::Approved),
            Some(TransferStatus::Rejected),
            Some(TransferStatus::Pending),
        ] {
            let state = resolve(&latest(transfer_status, Some(RepairStatus::Pending)));
            assert_eq!(state.status, ItemStatus::PendingRepair);
            assert_eq!(state.label, "Pending Repair");
            assert!(state.locked);
        }
    }

    #[test]
    fn pending_transfer_locks() {
        let state = resolve(&latest(
            Some(TransferStatus::Pending),
            Some(RepairStatus::Repaired),
        ));
        assert_eq!(state.status, ItemStatus::PendingTransfer);
        assert!(state.locked);
    }

    #[test]
    fn pending_transfer_outranks_disposal() {
        let state = resolve(&latest(
            Some(TransferStatus::Pending),
            Some(RepairStatus::Disposed),
        ));
        assert_eq!(state.status, ItemStatus::PendingTransfer);
    }

    #[test]
    fn disposed_items_stay_locked() {
        let state = resolve(&latest(
            Some(TransferStatus::Approved),
            Some(RepairStatus::Disposed),
        ));
        assert_eq!(state.status, ItemStatus::Disposed);
        assert!(state.locked);
    }

    #[test]
    fn closed_requests_leave_item_available() {
        for repair_status in [
            RepairStatus::Repaired,
            RepairStatus::PoCreated,
            RepairStatus::Rejected,
        ] {
            let state = resolve(&latest(Some(TransferStatus::Rejected), Some(repair_status)));
            assert_eq!(state, ItemState::new(ItemStatus::Available, false));
        }
    }

    #[test]
    fn status_serializes_as_tagged_variant() {
        let state = resolve(&latest(Some(TransferStatus::Pending), None));
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json["status"]["kind"], "PendingTransfer");
        assert_eq!(json["label"], "Pending Transfer");
        assert_eq!(json["locked"], true);
        assert_eq!("pendingrepair".parse::<ItemStatus>(), Ok(ItemStatus::PendingRepair));
    }

    #[test]
    fn transfer_transitions_only_leave_pending() {
        assert!(check_transfer_transition(TransferStatus::Pending, TransferStatus::Approved).is_ok());
        assert!(check_transfer_transition(TransferStatus::Pending, TransferStatus::Rejected).is_ok());
        assert!(check_transfer_transition(TransferStatus::Pending, TransferStatus::Pending).is_err());
        assert!(matches!(
            check_transfer_transition(TransferStatus::Approved, TransferStatus::Rejected),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn repair_transitions_allow_po_follow_up() {
        assert!(check_repair_transition(RepairStatus::Pending, RepairStatus::PoCreated).is_ok());
        assert!(check_repair_transition(RepairStatus::PoCreated, RepairStatus::Repaired).is_ok());
        assert!(check_repair_transition(RepairStatus::PoCreated, RepairStatus::Rejected).is_err());
        assert!(check_repair_transition(RepairStatus::Disposed, RepairStatus::Repaired).is_err());
        assert!(check_repair_transition(RepairStatus::Pending, RepairStatus::Pending).is_err());
    }

    #[test]
    fn status_filter_accepts_labels() {
        assert_eq!(
            ItemStatus::from_filter("Pending Transfer"),
            Some(ItemStatus::PendingTransfer)
        );
        assert_eq!(
            ItemStatus::from_filter("pending repair"),
            Some(ItemStatus::PendingRepair)
        );
        assert_eq!(ItemStatus::from_filter("Disposed"), Some(ItemStatus::Disposed));
        assert_eq!(ItemStatus::from_filter("Lost"), None);
    }

    #[test]
    fn only_the_latest_repair_can_be_resolved() {
        let mut newer = repair(RepairStatus::Rejected);
        newer.id = 2;
        let latest = LatestRequests {
            transfer: None,
            repair: Some(newer),
        };
        assert!(check_repair_is_current(2, &latest).is_ok());
        assert!(matches!(
            check_repair_is_current(1, &latest),
            Err(AppError::Conflict(_))
        ));
        assert!(check_repair_is_current(1, &LatestRequests::default()).is_ok());
    }
}
