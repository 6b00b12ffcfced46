//! Concurrent submissions against one item: the lock check and the insert must be atomic,
//! so exactly one submission wins.

use std::sync::Arc;

use assetdesk::{
    error::AppError,
    models::{ItemType, Role},
    store::{
        MemoryStore, NewItem, NewParentItem, NewRepairRequest, NewRoom, NewTransferRequest,
        NewUser, Store,
    },
};
use tokio::task::JoinHandle;

const SUBMISSIONS: usize = 16;

struct Fixture {
    store: Arc<MemoryStore>,
    item_id: i64,
    destination_room_id: i64,
    requestor_id: i64,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let requestor = store
        .insert_user(NewUser {
            name: "Department".into(),
            email: "department@inventory.com".into(),
            password_hash: "not-a-real-hash".into(),
            role: Role::Department,
        })
        .await
        .unwrap();
    let origin = store
        .insert_room(NewRoom {
            name: "Lab 101".into(),
            room_type: "Lab".into(),
            building_id: None,
        })
        .await
        .unwrap();
    let destination = store
        .insert_room(NewRoom {
            name: "Lab 102".into(),
            room_type: "Lab".into(),
            building_id: None,
        })
        .await
        .unwrap();
    let parent = store
        .insert_parent_item(NewParentItem {
            name: "Desktop".into(),
            item_type: ItemType::Pc,
            description: None,
        })
        .await
        .unwrap();
    let item = store
        .insert_item(NewItem {
            parent_item_id: parent.id,
            serial_number: "SN-RACE-1".into(),
            brand: "Dell".into(),
            room_id: Some(origin.id),
            remarks: None,
        })
        .await
        .unwrap();

    Fixture {
        store,
        item_id: item.id,
        destination_room_id: destination.id,
        requestor_id: requestor.id,
    }
}

fn transfer(fixture: &Fixture) -> JoinHandle<Result<i64, AppError>> {
    let store = fixture.store.clone();
    let request = NewTransferRequest {
        item_id: fixture.item_id,
        destination_room_id: fixture.destination_room_id,
        requestor_id: fixture.requestor_id,
        details: None,
        file_attachment_id: None,
    };
    tokio::spawn(async move { Ok(store.create_transfer_request(request).await?.id) })
}

fn repair(fixture: &Fixture) -> JoinHandle<Result<i64, AppError>> {
    let store = fixture.store.clone();
    let request = NewRepairRequest {
        item_id: fixture.item_id,
        requestor_id: fixture.requestor_id,
        details: "Will not boot".into(),
        file_attachment_id: None,
    };
    tokio::spawn(async move { Ok(store.create_repair_request(request).await?.id) })
}

/// Awaits every submission and returns (accepted, conflicts).
async fn outcomes(handles: Vec<JoinHandle<Result<i64, AppError>>>) -> (usize, usize) {
    let mut accepted = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    (accepted, conflicts)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_admit_exactly_one() {
    let fixture = fixture().await;

    let handles = (0..SUBMISSIONS).map(|_| transfer(&fixture)).collect();
    let (accepted, conflicts) = outcomes(handles).await;

    assert_eq!(accepted, 1);
    assert_eq!(conflicts, SUBMISSIONS - 1);
    let rows = fixture
        .store
        .item_transfer_requests(fixture.item_id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mixed_submissions_admit_exactly_one() {
    let fixture = fixture().await;

    let handles = (0..SUBMISSIONS)
        .map(|n| {
            if n % 2 == 0 {
                transfer(&fixture)
            } else {
                repair(&fixture)
            }
        })
        .collect();
    let (accepted, conflicts) = outcomes(handles).await;

    assert_eq!(accepted, 1);
    assert_eq!(conflicts, SUBMISSIONS - 1);
    let transfers = fixture
        .store
        .item_transfer_requests(fixture.item_id)
        .await
        .unwrap();
    let repairs = fixture
        .store
        .item_repair_requests(fixture.item_id)
        .await
        .unwrap();
    assert_eq!(transfers.len() + repairs.len(), 1);
}
