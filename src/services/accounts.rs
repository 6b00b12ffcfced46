use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::check;
use crate::{
    config::Config,
    error::AppError,
    middleware::CurrentUser,
    models::{
        AccountPayload, AccountUpdatePayload, LoginRequest, RegisterRequest, Role, Session, User,
        UserResponse,
    },
    store::{NewUser, Store, UserChanges, UserFilter},
    utils::{create_token, hash_password, verify_password, Claims},
};

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountListQuery {
    pub search: Option<String>,
    pub role: Option<Role>,
    #[serde(default)]
    pub archived: bool,
}

fn hash(config: &Config, password: &str) -> Result<String, AppError> {
    hash_password(password, config.bcrypt_cost)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Self-service sign-up. New accounts always start with the `Department` role.
pub async fn register(
    store: &dyn Store,
    config: &Config,
    payload: RegisterRequest,
) -> Result<User, AppError> {
    check(&payload, &[("name", payload.name.as_str())])?;
    let user = store
        .insert_user(NewUser {
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_string(),
            password_hash: hash(config, &payload.password)?,
            role: Role::Department,
        })
        .await?;
    info!("Registered user {} ({})", user.id, user.email);
    Ok(user)
}

pub async fn login(
    store: &dyn Store,
    config: &Config,
    payload: LoginRequest,
) -> Result<LoginResponse, AppError> {
    check(&payload, &[("email", payload.email.as_str())])?;
    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());

    let user = store
        .find_user_by_email(payload.email.trim())
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&payload.password, &user.password_hash).unwrap_or(false) {
        warn!("Failed login for {}", user.email);
        return Err(invalid());
    }

    let now = Utc::now();
    let session = Session {
        id: Uuid::new_v4(),
        user_id: user.id,
        expires_at: now + Duration::hours(config.session_ttl_hours),
        created_at: now,
    };
    let claims = Claims::new(
        user.id,
        user.email.clone(),
        session.id,
        config.session_ttl_hours,
    );
    let token = create_token(&config.jwt_secret, &claims)
        .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))?;

    let expires_at = session.expires_at;
    store.insert_session(session).await?;
    info!("User {} logged in", user.id);

    Ok(LoginResponse {
        token,
        token_type: "Bearer",
        expires_at,
        user: user.into(),
    })
}

pub async fn logout(store: &dyn Store, user: &CurrentUser) -> Result<(), AppError> {
    store.delete_session(user.session_id).await?;
    info!("User {} logged out", user.id);
    Ok(())
}

pub async fn list(store: &dyn Store, query: &AccountListQuery) -> Result<Vec<User>, AppError> {
    store
        .list_users(&UserFilter {
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            role: query.role,
            archived: query.archived,
        })
        .await
}

pub async fn get(store: &dyn Store, id: i64) -> Result<User, AppError> {
    store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))
}

pub async fn create(
    store: &dyn Store,
    config: &Config,
    payload: AccountPayload,
) -> Result<User, AppError> {
    check(&payload, &[("name", payload.name.as_str())])?;
    let role = payload
        .role
        .ok_or_else(|| AppError::invalid("role", "The role field is required."))?;
    let user = store
        .insert_user(NewUser {
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_string(),
            password_hash: hash(config, &payload.password)?,
            role,
        })
        .await?;
    info!("Created account {} ({}) as {}", user.id, user.email, user.role);
    Ok(user)
}

pub async fn update(
    store: &dyn Store,
    config: &Config,
    id: i64,
    payload: AccountUpdatePayload,
) -> Result<User, AppError> {
    check(&payload, &[("name", payload.name.as_str())])?;
    let role = payload
        .role
        .ok_or_else(|| AppError::invalid("role", "The role field is required."))?;
    let password_hash = match payload.password.as_deref() {
        Some(password) => Some(hash(config, password)?),
        None => None,
    };
    store
        .update_user(
            id,
            UserChanges {
                name: payload.name.trim().to_string(),
                email: payload.email.trim().to_string(),
                password_hash,
                role,
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("User", id))
}

/// Archives an account and ends all of its sessions. Administrators cannot archive
/// themselves.
pub async fn archive(store: &dyn Store, actor: &CurrentUser, id: i64) -> Result<(), AppError> {
    if actor.id == id {
        return Err(AppError::Conflict(
            "You cannot archive your own account".to_string(),
        ));
    }
    if !store.archive_user(id).await? {
        return Err(AppError::not_found("User", id));
    }
    info!("Archived user {}", id);
    Ok(())
}
