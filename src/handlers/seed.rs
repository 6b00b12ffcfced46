use axum::{extract::State, Json};

use crate::{
    error::AppError,
    services::seed::{self, SeedSummary},
    state::AppState,
};

/// Development-only: wipes and reloads the fixed data set. Mounted when seeding is enabled.
pub async fn reseed(State(state): State<AppState>) -> Result<Json<SeedSummary>, AppError> {
    Ok(Json(seed::reseed(state.store(), &state.config).await?))
}
