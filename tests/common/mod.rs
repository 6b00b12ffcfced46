#![allow(dead_code)]

use std::sync::Arc;

use assetdesk::{
    models::{Role, User},
    routes::create_router,
    store::{MemoryStore, NewUser, Store},
    utils::hash_password,
    AppState, Config,
};
use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const PASSWORD: &str = "secret-password";

/// Full router over a fresh in-memory store.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(Config::for_memory("integration-test-secret"))
    }

    pub fn with_config(config: Config) -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()), config);
        Self {
            router: create_router(state.clone()),
            state,
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.state.store()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).expect("request")).await
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.expect("response")
    }

    /// Sends a request and returns the status with the decoded JSON body (`Null` when empty).
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: &str,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, body, Some(token)).await;
        let status = response.status();
        (status, response_json(response).await)
    }

    pub async fn create_user(&self, name: &str, email: &str, role: Role) -> User {
        let password_hash =
            hash_password(PASSWORD, self.state.config.bcrypt_cost).expect("hash password");
        self.store()
            .insert_user(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                role,
            })
            .await
            .expect("insert user")
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.request(
            Method::POST,
            "/auth/login",
            Some(json!({ "email": email, "password": password })),
            None,
        )
        .await
    }

    /// Creates a user with the given role and returns it with a bearer token.
    pub async fn user_with_token(&self, role: Role) -> (User, String) {
        let email = format!("{}@inventory.com", role.as_ref().to_lowercase());
        let user = self.create_user(role.as_ref(), &email, role).await;
        let response = self.login(&email, PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        let token = body["token"].as_str().expect("token").to_string();
        (user, token)
    }

    pub async fn admin_token(&self) -> String {
        self.user_with_token(Role::Admin).await.1
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("json response")
}

/// Building, room and an item placed in that room; returns `(room_id, item_id)`.
pub async fn item_in_room(app: &TestApp, token: &str, serial: &str) -> (i64, i64) {
    let (status, building) = app
        .call(
            Method::POST,
            "/buildings",
            Some(json!({ "name": format!("Building for {serial}") })),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, room) = app
        .call(
            Method::POST,
            "/rooms",
            Some(json!({
                "name": format!("Room for {serial}"),
                "room_type": "Room",
                "building_id": building["id"],
            })),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, parent) = app
        .call(
            Method::POST,
            "/inventories",
            Some(json!({ "name": "Desktop", "item_type": "PC" })),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, item) = app
        .call(
            Method::POST,
            &format!("/inventories/{}/items", parent["id"]),
            Some(json!({
                "serial_number": serial,
                "brand": "Generic",
                "room_id": room["id"],
            })),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    (
        room["id"].as_i64().expect("room id"),
        item["id"].as_i64().expect("item id"),
    )
}

pub async fn room(app: &TestApp, token: &str, name: &str) -> i64 {
    let (status, room) = app
        .call(
            Method::POST,
            "/rooms",
            Some(json!({ "name": name, "room_type": "Lab" })),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    room["id"].as_i64().expect("room id")
}
