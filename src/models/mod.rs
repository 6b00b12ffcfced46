pub mod building;
pub mod inventory;
pub mod request;
pub mod room;
pub mod user;

use serde::Deserialize;

pub use building::{Building, BuildingPayload, CustodianAllocation};
pub use inventory::{
    InventoryItem, InventoryParentItem, ItemListQuery, ItemPayload, ItemRoomAllocation, ItemType, ItemView,
    ParentItemPayload,
};
pub use request::{
    LatestRequests, RepairRequest, RepairRequestPayload, RepairStatus, RequestListQuery,
    ResolveRepairPayload, ResolveTransferPayload, TransferRequest, TransferRequestPayload, TransferStatus,
};
pub use room::{Room, RoomAllocation, RoomPayload};
pub use user::{
    AccountPayload, AccountUpdatePayload, LoginRequest, RegisterRequest, Role, Session, User,
    UserResponse,
};

/// Query string accepted by the list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

impl ListQuery {
    /// The trimmed search term, or `None` when it is absent or blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

/// Case-insensitive substring match used by the in-memory store and client-side filters.
pub fn matches_search(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_search_is_ignored() {
        let query = ListQuery {
            search: Some("   ".into()),
            archived: false,
        };
        assert_eq!(query.search_term(), None);
    }

    #[test]
    fn search_is_case_insensitive() {
        assert!(matches_search("Lab 201", Some("lab")));
        assert!(matches_search("SN-00AF", Some("00af")));
        assert!(!matches_search("Room 101", Some("lab")));
        assert!(matches_search("anything", None));
    }
}
