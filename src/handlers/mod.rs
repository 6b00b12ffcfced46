pub mod accounts;
pub mod auth;
pub mod buildings;
pub mod custodians;
pub mod inventory;
pub mod items;
pub mod requests;
pub mod rooms;
pub mod seed;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::AppError;

/// `Json<T>` whose rejections are reported in the API's validation error format.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::invalid("body", rejection.body_text()))?;
        Ok(Self(value))
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
