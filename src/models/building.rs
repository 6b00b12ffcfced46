use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Building {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BuildingPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "The name field is required."))]
    pub name: String,
}

/// Replaces the set of buildings a custodian is responsible for.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustodianAllocation {
    #[validate(required(message = "The custodian id field is required."))]
    pub custodian_id: Option<i64>,
    #[serde(default)]
    pub building_ids: Vec<i64>,
}
