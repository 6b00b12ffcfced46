use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::Utc;
use log::debug;
use serde::Serialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{error::AppError, models::Role, state::AppState, utils::verify_token};

pub const AUTH_COOKIE: &str = "auth_token";

/// The authenticated caller, resolved from the bearer token (or the `auth_token` cookie)
/// and handed explicitly to every operation that needs it.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip)]
    pub session_id: Uuid,
}

impl CurrentUser {
    /// Admins pass every role check.
    pub fn has_role(&self, roles: &[Role]) -> bool {
        self.role == Role::Admin || roles.contains(&self.role)
    }

    pub fn require(&self, roles: &[Role]) -> Result<(), AppError> {
        if self.has_role(roles) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You are not allowed to perform this action".to_string(),
            ))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require(&[Role::Admin])
    }
}

/// Validates a token against its signature, its session row and the user it names.
pub async fn authenticate(state: &AppState, token: &str) -> Result<CurrentUser, AppError> {
    let unauthorized = || AppError::Unauthorized("Unauthenticated.".to_string());

    let claims = verify_token(&state.config.jwt_secret, token).map_err(|e| {
        debug!("Rejected token: {}", e);
        unauthorized()
    })?;
    let user_id = claims.user_id().ok_or_else(unauthorized)?;

    let session = state
        .store()
        .find_session(claims.sid)
        .await?
        .filter(|session| session.user_id == user_id && !session.is_expired(Utc::now()))
        .ok_or_else(unauthorized)?;

    let user = state
        .store()
        .find_user(user_id)
        .await?
        .ok_or_else(unauthorized)?;

    Ok(CurrentUser {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        session_id: session.id,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let bearer = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string());

        let token = match bearer {
            Some(token) => Some(token),
            None => Cookies::from_request_parts(parts, state)
                .await
                .ok()
                .and_then(|cookies| cookies.get(AUTH_COOKIE).map(|c| c.value().to_string())),
        };

        let token =
            token.ok_or_else(|| AppError::Unauthorized("Unauthenticated.".to_string()))?;
        authenticate(state, &token).await
    }
}
