use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health))
        // Auth
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
        // Buildings
        .route(
            "/buildings",
            get(handlers::buildings::index).post(handlers::buildings::store),
        )
        .route("/buildings/all", get(handlers::buildings::all))
        .route("/buildings/search/:name", get(handlers::buildings::search))
        .route(
            "/buildings/custodian-allocate",
            post(handlers::buildings::custodian_allocate),
        )
        .route(
            "/buildings/:id",
            get(handlers::buildings::show)
                .put(handlers::buildings::update)
                .delete(handlers::buildings::destroy),
        )
        .route("/buildings/:id/rooms", get(handlers::buildings::rooms))
        // Rooms
        .route(
            "/rooms",
            get(handlers::rooms::index).post(handlers::rooms::store),
        )
        .route("/rooms/all", get(handlers::rooms::all))
        .route("/rooms/unallocated", get(handlers::rooms::unallocated))
        .route(
            "/rooms/:id",
            get(handlers::rooms::show)
                .put(handlers::rooms::update)
                .delete(handlers::rooms::destroy),
        )
        .route("/rooms/:id/allocate", post(handlers::rooms::allocate))
        .route("/rooms/:id/unallocate", post(handlers::rooms::unallocate))
        // Inventory parent items
        .route(
            "/inventories",
            get(handlers::inventory::index).post(handlers::inventory::store),
        )
        .route(
            "/inventories/:id",
            get(handlers::inventory::show)
                .put(handlers::inventory::update)
                .delete(handlers::inventory::destroy),
        )
        .route(
            "/inventories/:id/items",
            get(handlers::inventory::items).post(handlers::inventory::store_item),
        )
        .route(
            "/inventories/:id/allocate-room",
            post(handlers::inventory::allocate_room),
        )
        // Item instances
        .route(
            "/items/:id",
            get(handlers::items::show)
                .put(handlers::items::update)
                .delete(handlers::items::destroy),
        )
        .route("/items/:id/allocate-room", post(handlers::items::allocate_room))
        .route(
            "/items/:id/unallocate-room",
            post(handlers::items::unallocate_room),
        )
        .route("/items/:id/status", get(handlers::items::status))
        .route("/items/:id/requests", get(handlers::items::history))
        .route(
            "/items/:id/transfer-requests",
            post(handlers::items::request_transfer),
        )
        .route(
            "/items/:id/repair-requests",
            post(handlers::items::request_repair),
        )
        // Requests
        .route("/transfer-requests", get(handlers::requests::transfers))
        .route(
            "/transfer-requests/:id",
            get(handlers::requests::show_transfer),
        )
        .route(
            "/transfer-requests/:id/resolve",
            post(handlers::requests::resolve_transfer),
        )
        .route("/repair-requests", get(handlers::requests::repairs))
        .route("/repair-requests/:id", get(handlers::requests::show_repair))
        .route(
            "/repair-requests/:id/resolve",
            post(handlers::requests::resolve_repair),
        )
        // Accounts
        .route(
            "/accounts",
            get(handlers::accounts::index).post(handlers::accounts::store),
        )
        .route(
            "/accounts/:id",
            get(handlers::accounts::show)
                .put(handlers::accounts::update)
                .delete(handlers::accounts::destroy),
        )
        // Custodians
        .route(
            "/custodians/:id/buildings",
            get(handlers::custodians::buildings),
        )
        .route(
            "/custodians/:id/inventory",
            get(handlers::custodians::inventory),
        );

    if state.config.enable_seed {
        router = router.route("/reseed", get(handlers::seed::reseed));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CookieManagerLayer::new())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(2 * 1024 * 1024)),
        )
        .with_state(state)
}
