use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tower_cookies::{Cookie, Cookies};

use super::ApiJson;
use crate::{
    error::AppError,
    middleware::{CurrentUser, AUTH_COOKIE},
    models::{LoginRequest, RegisterRequest, UserResponse},
    services::accounts::{self, LoginResponse},
    state::AppState,
};

pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = accounts::register(state.store(), &state.config, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = accounts::login(state.store(), &state.config, payload).await?;

    // Browser clients can rely on the cookie instead of the bearer header
    let cookie = Cookie::build((AUTH_COOKIE, response.token.clone()))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::hours(state.config.session_ttl_hours))
        .build();
    cookies.add(cookie);

    Ok(Json(response))
}

pub async fn logout(
    State(state): State<AppState>,
    cookies: Cookies,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    accounts::logout(state.store(), &user).await?;
    cookies.remove(Cookie::build((AUTH_COOKIE, "")).path("/").build());
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(user: CurrentUser) -> Json<CurrentUser> {
    Json(user)
}
