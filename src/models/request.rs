use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{AsRefStr, Display, EnumString};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
}

impl TryFrom<String> for TransferStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RepairStatus {
    Pending,
    Repaired,
    PoCreated,
    Rejected,
    Disposed,
}

impl RepairStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RepairStatus::Pending => "Pending",
            RepairStatus::Repaired => "Repaired",
            RepairStatus::PoCreated => "PO created",
            RepairStatus::Rejected => "Rejected",
            RepairStatus::Disposed => "Disposed",
        }
    }
}

impl TryFrom<String> for RepairStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TransferRequest {
    pub id: i64,
    pub item_id: i64,
    pub current_room_id: Option<i64>,
    pub destination_room_id: i64,
    pub requestor_id: i64,
    #[sqlx(try_from = "String")]
    pub status: TransferStatus,
    pub details: Option<String>,
    pub rejection_details: Option<String>,
    pub file_attachment_id: Option<i64>,
    pub resolved_by: Option<i64>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RepairRequest {
    pub id: i64,
    pub item_id: i64,
    pub requestor_id: i64,
    #[sqlx(try_from = "String")]
    pub status: RepairStatus,
    pub details: String,
    pub handler_id: Option<i64>,
    pub file_attachment_id: Option<i64>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The most recent transfer and repair request of one item, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatestRequests {
    pub transfer: Option<TransferRequest>,
    pub repair: Option<RepairRequest>,
}

impl LatestRequests {
    /// Keeps `candidate` if it is newer than the transfer seen so far.
    pub fn offer_transfer(&mut self, candidate: &TransferRequest) {
        let newer = match &self.transfer {
            Some(current) => {
                (candidate.created_at, candidate.id) > (current.created_at, current.id)
            }
            None => true,
        };
        if newer {
            self.transfer = Some(candidate.clone());
        }
    }

    pub fn offer_repair(&mut self, candidate: &RepairRequest) {
        let newer = match &self.repair {
            Some(current) => {
                (candidate.created_at, candidate.id) > (current.created_at, current.id)
            }
            None => true,
        };
        if newer {
            self.repair = Some(candidate.clone());
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransferRequestPayload {
    #[validate(required(message = "The destination room id field is required."))]
    pub destination_room_id: Option<i64>,
    pub details: Option<String>,
    pub file_attachment_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RepairRequestPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "The details field is required."))]
    pub details: String,
    pub file_attachment_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResolveTransferPayload {
    #[validate(required(message = "The decision field is required."))]
    pub decision: Option<TransferStatus>,
    pub rejection_details: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResolveRepairPayload {
    #[validate(required(message = "The status field is required."))]
    pub status: Option<RepairStatus>,
    pub details: Option<String>,
}

/// Query string for request listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestListQuery {
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn transfer(id: i64, created_at: DateTime<Utc>) -> TransferRequest {
        TransferRequest {
            id,
            item_id: 1,
            current_room_id: None,
            destination_room_id: 2,
            requestor_id: 1,
            status: TransferStatus::Pending,
            details: None,
            rejection_details: None,
            file_attachment_id: None,
            resolved_by: None,
            resolved_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn statuses_use_snake_case_text() {
        assert_eq!(RepairStatus::PoCreated.as_ref(), "po_created");
        assert_eq!(RepairStatus::PoCreated.label(), "PO created");
        assert_eq!(
            TransferStatus::try_from("approved".to_string()).unwrap(),
            TransferStatus::Approved
        );
        assert_eq!(
            serde_json::to_string(&RepairStatus::PoCreated).unwrap(),
            "\"po_created\""
        );
    }

    #[test]
    fn latest_prefers_newest_then_highest_id() {
        let now = Utc::now();
        let mut latest = LatestRequests::default();
        latest.offer_transfer(&transfer(1, now));
        latest.offer_transfer(&transfer(2, now - Duration::minutes(5)));
        assert_eq!(latest.transfer.as_ref().map(|t| t.id), Some(1));

        latest.offer_transfer(&transfer(3, now));
        assert_eq!(latest.transfer.as_ref().map(|t| t.id), Some(3));
    }
}
