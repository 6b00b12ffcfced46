pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;
pub mod workflow;

pub use config::Config;
pub use error::{AppError, FieldErrors};
pub use state::AppState;
