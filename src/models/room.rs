use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub room_type: String,
    pub building_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Room {
    pub fn is_allocated(&self) -> bool {
        self.building_id.is_some()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RoomPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "The name field is required."))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "The room type field is required."))]
    pub room_type: String,
    pub building_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RoomAllocation {
    #[validate(required(message = "The building id field is required."))]
    pub building_id: Option<i64>,
}
