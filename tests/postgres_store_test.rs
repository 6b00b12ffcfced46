//! Store tests against a real Postgres database. Run with
//! `DATABASE_URL=postgres://... cargo test -- --ignored`.

use assetdesk::{
    config::Config,
    database::{create_database_pool, run_migrations},
    error::AppError,
    services::seed,
    store::{ItemFilter, ListFilter, NewTransferRequest, PgStore, Store},
    workflow,
};

async fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = create_database_pool(&url).await.expect("connect");
    run_migrations(&pool).await.expect("migrations");
    PgStore::new(pool)
}

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn pending_transfer_locks_the_item_row() {
    let store = store().await;
    seed::reseed(&store, &Config::for_memory("pg-test-secret"))
        .await
        .expect("reseed");

    let items = store
        .list_items(&ItemFilter::default())
        .await
        .expect("items");
    let rooms = store
        .list_rooms(&Default::default())
        .await
        .expect("rooms");
    let admin = store
        .find_user_by_email("admin@inventory.com")
        .await
        .expect("query")
        .expect("seeded admin");

    let request = NewTransferRequest {
        item_id: items[0].id,
        destination_room_id: rooms[0].id,
        requestor_id: admin.id,
        details: None,
        file_attachment_id: None,
    };
    store
        .create_transfer_request(request.clone())
        .await
        .expect("first transfer");

    let second = store.create_transfer_request(request).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    let latest = store
        .latest_requests(&[items[0].id])
        .await
        .expect("latest")
        .remove(&items[0].id)
        .unwrap_or_default();
    assert!(workflow::resolve(&latest).locked);
}

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn archived_buildings_leave_the_default_listing() {
    let store = store().await;
    seed::reseed(&store, &Config::for_memory("pg-test-secret"))
        .await
        .expect("reseed");

    let buildings = store
        .list_buildings(&ListFilter::default())
        .await
        .expect("buildings");
    assert_eq!(buildings.len(), 3);

    assert!(store.archive_building(buildings[0].id).await.expect("archive"));
    let remaining = store
        .list_buildings(&ListFilter::default())
        .await
        .expect("buildings");
    assert_eq!(remaining.len(), 2);
}
