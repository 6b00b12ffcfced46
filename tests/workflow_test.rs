//! End-to-end request workflow tests driven through the HTTP router.

mod common;

use assetdesk::models::Role;
use axum::http::{Method, StatusCode};
use common::{item_in_room, room, TestApp};
use serde_json::json;

#[tokio::test]
async fn approved_transfer_moves_the_item_and_unlocks_it() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (origin, item) = item_in_room(&app, &admin, "SN-1001").await;
    let destination = room(&app, &admin, "Lab 201").await;

    let (status, request) = app
        .call(
            Method::POST,
            &format!("/items/{item}/transfer-requests"),
            Some(json!({ "destination_room_id": destination, "details": "Needed in the lab" })),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");
    assert_eq!(request["current_room_id"], origin);

    let (_, state) = app
        .call(Method::GET, &format!("/items/{item}/status"), None, &admin)
        .await;
    assert_eq!(state["status"]["kind"], "PendingTransfer");
    assert_eq!(state["label"], "Pending Transfer");
    assert_eq!(state["locked"], true);

    let (status, resolved) = app
        .call(
            Method::POST,
            &format!("/transfer-requests/{}/resolve", request["id"]),
            Some(json!({ "decision": "approved" })),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "approved");
    assert!(resolved["resolved_at"].is_string());

    let (_, view) = app
        .call(Method::GET, &format!("/items/{item}"), None, &admin)
        .await;
    assert_eq!(view["room_id"], destination);
    assert_eq!(view["room_name"], "Lab 201");
    assert_eq!(view["state"]["status"]["kind"], "Available");
    assert_eq!(view["state"]["locked"], false);
}

#[tokio::test]
async fn locked_item_refuses_new_requests_without_writing() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (_, item) = item_in_room(&app, &admin, "SN-2001").await;
    let destination = room(&app, &admin, "Lab 202").await;

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/items/{item}/repair-requests"),
            Some(json!({ "details": "Screen flickers" })),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/items/{item}/transfer-requests"),
            Some(json!({ "destination_room_id": destination })),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].is_string());

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/items/{item}/repair-requests"),
            Some(json!({ "details": "Second report" })),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, history) = app
        .call(Method::GET, &format!("/items/{item}/requests"), None, &admin)
        .await;
    assert_eq!(history["transfers"].as_array().map(Vec::len), Some(0));
    assert_eq!(history["repairs"].as_array().map(Vec::len), Some(1));

    let (_, state) = app
        .call(Method::GET, &format!("/items/{item}/status"), None, &admin)
        .await;
    assert_eq!(state["status"]["kind"], "PendingRepair");
}

#[tokio::test]
async fn repair_outcomes_drive_the_item_status() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (_, worker) = app.user_with_token(Role::Worker).await;
    let (_, item) = item_in_room(&app, &admin, "SN-3001").await;

    let (_, repair) = app
        .call(
            Method::POST,
            &format!("/items/{item}/repair-requests"),
            Some(json!({ "details": "Broken leg" })),
            &admin,
        )
        .await;
    let resolve = format!("/repair-requests/{}/resolve", repair["id"]);

    let (status, updated) = app
        .call(
            Method::POST,
            &resolve,
            Some(json!({ "status": "po_created" })),
            &worker,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "po_created");

    let (_, state) = app
        .call(Method::GET, &format!("/items/{item}/status"), None, &admin)
        .await;
    assert_eq!(state["status"]["kind"], "Available");

    let (status, updated) = app
        .call(
            Method::POST,
            &resolve,
            Some(json!({ "status": "disposed", "details": "Beyond repair" })),
            &worker,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["details"], "Beyond repair");

    let (_, state) = app
        .call(Method::GET, &format!("/items/{item}/status"), None, &admin)
        .await;
    assert_eq!(state["status"]["kind"], "Disposed");
    assert_eq!(state["locked"], true);

    // Terminal states cannot be resolved again
    let (status, _) = app
        .call(
            Method::POST,
            &resolve,
            Some(json!({ "status": "repaired" })),
            &worker,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .call(Method::DELETE, &format!("/items/{item}"), None, &admin)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn rejecting_a_transfer_requires_details_and_keeps_the_room() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (origin, item) = item_in_room(&app, &admin, "SN-4001").await;
    let destination = room(&app, &admin, "Storage").await;

    let (_, request) = app
        .call(
            Method::POST,
            &format!("/items/{item}/transfer-requests"),
            Some(json!({ "destination_room_id": destination })),
            &admin,
        )
        .await;
    let resolve = format!("/transfer-requests/{}/resolve", request["id"]);

    let (status, body) = app
        .call(
            Method::POST,
            &resolve,
            Some(json!({ "decision": "rejected" })),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["rejection_details"].is_array());

    let (status, resolved) = app
        .call(
            Method::POST,
            &resolve,
            Some(json!({ "decision": "rejected", "rejection_details": "Room is full" })),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["rejection_details"], "Room is full");

    let (status, _) = app
        .call(
            Method::POST,
            &resolve,
            Some(json!({ "decision": "approved" })),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, view) = app
        .call(Method::GET, &format!("/items/{item}"), None, &admin)
        .await;
    assert_eq!(view["room_id"], origin);
    assert_eq!(view["state"]["status"]["kind"], "Available");

    let (_, pending) = app
        .call(Method::GET, "/transfer-requests?status=pending", None, &admin)
        .await;
    assert_eq!(pending.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn transfer_to_the_current_room_is_invalid() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (origin, item) = item_in_room(&app, &admin, "SN-5001").await;

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/items/{item}/transfer-requests"),
            Some(json!({ "destination_room_id": origin })),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["destination_room_id"].is_array());

    let (status, _) = app
        .call(
            Method::POST,
            "/items/9999/transfer-requests",
            Some(json!({ "destination_room_id": origin })),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_admins_resolve_transfers() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (_, department) = app.user_with_token(Role::Department).await;
    let (_, item) = item_in_room(&app, &admin, "SN-6001").await;
    let destination = room(&app, &admin, "Annex").await;

    let (status, request) = app
        .call(
            Method::POST,
            &format!("/items/{item}/transfer-requests"),
            Some(json!({ "destination_room_id": destination })),
            &department,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/transfer-requests/{}/resolve", request["id"]),
            Some(json!({ "decision": "approved" })),
            &department,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn item_status_filter_uses_the_resolved_state() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (_, item) = item_in_room(&app, &admin, "SN-7001").await;

    let (_, view) = app
        .call(Method::GET, &format!("/items/{item}"), None, &admin)
        .await;
    let parent = view["parent_item_id"].clone();

    app.call(
        Method::POST,
        &format!("/items/{item}/repair-requests"),
        Some(json!({ "details": "Fan noise" })),
        &admin,
    )
    .await;

    let (status, repairs) = app
        .call(
            Method::GET,
            &format!("/inventories/{parent}/items?status=PendingRepair"),
            None,
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(repairs.as_array().map(Vec::len), Some(1));

    let (_, available) = app
        .call(
            Method::GET,
            &format!("/inventories/{parent}/items?status=Available"),
            None,
            &admin,
        )
        .await;
    assert_eq!(available.as_array().map(Vec::len), Some(0));

    let (status, labelled) = app
        .call(
            Method::GET,
            &format!("/inventories/{parent}/items?status=Pending%20Repair"),
            None,
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(labelled.as_array().map(Vec::len), Some(1));
    assert_eq!(labelled[0]["id"], item);

    let (status, _) = app
        .call(
            Method::GET,
            &format!("/inventories/{parent}/items?status=Lost"),
            None,
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn approving_a_transfer_into_an_archived_room_fails() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (origin, item) = item_in_room(&app, &admin, "SN-8001").await;
    let destination = room(&app, &admin, "Old wing").await;

    let (_, request) = app
        .call(
            Method::POST,
            &format!("/items/{item}/transfer-requests"),
            Some(json!({ "destination_room_id": destination })),
            &admin,
        )
        .await;

    let (status, _) = app
        .call(Method::DELETE, &format!("/rooms/{destination}"), None, &admin)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/transfer-requests/{}/resolve", request["id"]),
            Some(json!({ "decision": "approved" })),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, view) = app
        .call(Method::GET, &format!("/items/{item}"), None, &admin)
        .await;
    assert_eq!(view["room_id"], origin);
    assert_eq!(view["state"]["status"]["kind"], "PendingTransfer");

    // The request can still be turned down
    let (status, resolved) = app
        .call(
            Method::POST,
            &format!("/transfer-requests/{}/resolve", request["id"]),
            Some(json!({ "decision": "rejected", "rejection_details": "Room closed" })),
            &admin,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "rejected");
}

#[tokio::test]
async fn superseded_repair_cannot_dispose_the_item() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (_, worker) = app.user_with_token(Role::Worker).await;
    let (_, item) = item_in_room(&app, &admin, "SN-9001").await;
    let submit = format!("/items/{item}/repair-requests");

    let (_, first) = app
        .call(Method::POST, &submit, Some(json!({ "details": "No power" })), &admin)
        .await;
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/repair-requests/{}/resolve", first["id"]),
            Some(json!({ "status": "po_created" })),
            &worker,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, second) = app
        .call(Method::POST, &submit, Some(json!({ "details": "Cracked case" })), &admin)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .call(
            Method::POST,
            &format!("/repair-requests/{}/resolve", second["id"]),
            Some(json!({ "status": "rejected" })),
            &worker,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/repair-requests/{}/resolve", first["id"]),
            Some(json!({ "status": "disposed" })),
            &worker,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].is_string());

    let (_, repair) = app
        .call(
            Method::GET,
            &format!("/repair-requests/{}", first["id"]),
            None,
            &admin,
        )
        .await;
    assert_eq!(repair["status"], "po_created");

    let (_, state) = app
        .call(Method::GET, &format!("/items/{item}/status"), None, &admin)
        .await;
    assert_eq!(state["status"]["kind"], "Available");
    assert_eq!(state["locked"], false);
}
