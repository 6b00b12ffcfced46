use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{AsRefStr, Display, EnumString};
use validator::Validate;

use crate::workflow::ItemState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
pub enum ItemType {
    #[serde(rename = "PC")]
    #[strum(serialize = "PC")]
    Pc,
    Fixture,
    Equipment,
    Furniture,
    Other,
}

impl TryFrom<String> for ItemType {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A catalogue entry ("Desktop", "Chair") that individual serial-numbered items belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InventoryParentItem {
    pub id: i64,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub item_type: ItemType,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

/// One physical, serial-numbered item. `room_id == None` means it is in stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct InventoryItem {
    pub id: i64,
    pub parent_item_id: i64,
    pub serial_number: String,
    pub brand: String,
    pub room_id: Option<i64>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

/// An item as returned by the API: the row, the names it references and its resolved state.
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub parent_name: Option<String>,
    pub room_name: Option<String>,
    pub state: ItemState,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ParentItemPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "The name field is required."))]
    pub name: String,
    #[validate(required(message = "The item type field is required."))]
    pub item_type: Option<ItemType>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ItemPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "The serial number field is required."))]
    pub serial_number: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "The brand field is required."))]
    pub brand: String,
    pub room_id: Option<i64>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ItemRoomAllocation {
    #[validate(required(message = "The room id field is required."))]
    pub room_id: Option<i64>,
}

/// Query string for item listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemListQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub archived: bool,
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_type_uses_display_names() {
        assert_eq!(ItemType::Pc.to_string(), "PC");
        assert_eq!(ItemType::try_from("PC".to_string()).unwrap(), ItemType::Pc);
        assert_eq!(
            serde_json::to_string(&ItemType::Fixture).unwrap(),
            "\"Fixture\""
        );
    }
}
