use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum Role {
    Admin,
    Custodian,
    Department,
    Worker,
}

impl TryFrom<String> for Role {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
            archived_at: user.archived_at,
        }
    }
}

/// A login session backing one issued token.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "The name field is required."))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 4, message = "The password must be at least 4 characters."))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "The email field is required."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "The password field is required."))]
    pub password: String,
}

/// Account created by an administrator, who also picks the role.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AccountPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "The name field is required."))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 4, message = "The password must be at least 4 characters."))]
    pub password: String,
    #[validate(required(message = "The role field is required."))]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AccountUpdatePayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "The name field is required."))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
    #[validate(length(min = 4, message = "The password must be at least 4 characters."))]
    pub password: Option<String>,
    #[validate(required(message = "The role field is required."))]
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!(Role::Custodian.as_ref(), "Custodian");
        assert_eq!(Role::try_from("Worker".to_string()).unwrap(), Role::Worker);
        assert!(Role::try_from("Janitor".to_string()).is_err());
    }

    #[test]
    fn register_request_requires_valid_fields() {
        let request = RegisterRequest {
            name: String::new(),
            email: "not-an-email".into(),
            password: "abc".into(),
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }
}
