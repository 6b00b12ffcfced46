use std::sync::Arc;

use dotenvy::dotenv;
use log::info;

use assetdesk::{
    config::StorageKind,
    database::{create_database_pool, run_migrations},
    routes::create_router,
    store::{MemoryStore, PgStore, Store},
    AppState, Config,
};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    let config = Config::from_env().expect("Invalid configuration");

    let store: Arc<dyn Store> = match config.storage {
        StorageKind::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL must be set");
            let pool = create_database_pool(database_url)
                .await
                .expect("Failed to connect to database");
            run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            info!("Database connection successful");
            Arc::new(PgStore::new(pool))
        }
        StorageKind::Memory => {
            info!("Using in-memory storage; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let addr = config.bind_address();
    if config.enable_seed {
        info!("Development reseed endpoint enabled at GET /reseed");
    }

    let app = create_router(AppState::new(store, config));

    info!("assetdesk server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
