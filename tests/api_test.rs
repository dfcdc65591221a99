mod common;

use axum::{ body::Body, http::{ Request, StatusCode }, Router };
use reward_settlement::api;
use reward_settlement::db::entity::completed_task;
use reward_settlement::identity::{ COUNTRY_HEADER, ROLE_HEADER, USER_ID_HEADER };
use sea_orm::{ EntityTrait, PaginatorTrait };
use serde_json::{ json, Value };
use tower::ServiceExt;

async fn app() -> (sea_orm::DatabaseConnection, api::AppState, Router) {
    let (db, state) = common::setup().await;
    let router = api::router(state.clone());
    (db, state, router)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn as_user(method: &str, uri: &str, user_id: i32, country: &str, role: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_ID_HEADER, user_id.to_string())
        .header(COUNTRY_HEADER, country)
        .header(ROLE_HEADER, role);

    match body {
        Some(body) =>
            builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn test_health() {
    let (_db, _state, router) = app().await;
    let (status, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_postback_missing_parameters() {
    let (_db, _state, router) = app().await;

    let (status, body) = send(&router, get("/api/postback?user_id=1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Missing parameters");

    let (status, body) = send(&router, get("/api/postback?user_id=abc&task_id=5")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Invalid parameters");
}

#[tokio::test]
async fn test_postback_then_duplicate() {
    let (db, state, router) = app().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;
    let bob = common::register(&state, "bob", "Ghana", Some(alice.referral_code.as_str())).await;

    let uri = format!("/api/postback?user_id={}&task_id=5&payout=3.00&transaction_id=tx-1", bob.id);

    let (status, body) = send(&router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let (status, body) = send(&router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK - Already Completed");

    assert_eq!(common::reload_user(&db, bob.id).await.balance_task_cents, 300);
    assert_eq!(common::reload_user(&db, alice.id).await.balance_referral_cents, 50);
}

#[tokio::test]
async fn test_postback_unknown_user() {
    let (db, _state, router) = app().await;
    let (status, body) = send(&router, get("/api/postback?user_id=999&task_id=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");

    let recorded = completed_task::Entity::find().count(&db).await.unwrap();
    assert_eq!(recorded, 0);
}

#[tokio::test]
async fn test_identity_is_required() {
    let (_db, _state, router) = app().await;

    let (status, body) = send(&router, get("/api/tasks")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_admin_routes_reject_users() {
    let (_db, state, router) = app().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;

    let (status, _) = send(
        &router,
        as_user("GET", "/api/admin/withdrawals", alice.id, "Nigeria", "user", None)
    ).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &router,
        as_user("GET", "/api/admin/withdrawals", alice.id, "Nigeria", "admin", None)
    ).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_and_login() {
    let (_db, _state, router) = app().await;

    let register = Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header("content-type", "application/json")
        .body(
            Body::from(
                json!({
                    "username": "alice",
                    "email": "alice@example.com",
                    "password": "s3cret",
                    "country": "Nigeria"
                }).to_string()
            )
        )
        .unwrap();

    let (status, body) = send(&router, register).await;
    assert_eq!(status, StatusCode::CREATED);
    let user: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(user["username"], "alice");
    assert_eq!(user["balance_task"], "0.00");
    assert!(user.get("password_hash").is_none());

    let login = |password: &str| {
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "username": "alice", "password": password }).to_string()))
            .unwrap()
    };

    let (status, body) = send(&router, login("s3cret")).await;
    assert_eq!(status, StatusCode::OK);
    let session: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(session["identity"]["country"], "Nigeria");
    assert_eq!(session["identity"]["role"], "user");

    let (status, _) = send(&router, login("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let (_db, state, router) = app().await;
    common::register(&state, "alice", "Nigeria", None).await;

    let register = Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header("content-type", "application/json")
        .body(
            Body::from(
                json!({
                    "username": "alice",
                    "email": "other@example.com",
                    "password": "s3cret",
                    "country": "Ghana"
                }).to_string()
            )
        )
        .unwrap();

    let (status, _) = send(&router, register).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_tasks_show_completion_state() {
    let (_db, state, router) = app().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;
    let done = common::create_task(&state, "Nigeria", 300).await;
    common::create_task(&state, "Nigeria", 100).await;
    common::create_task(&state, "Ghana", 100).await;

    let uri = format!("/api/postback?user_id={}&task_id={}", alice.id, done.id);
    send(&router, get(&uri)).await;

    let (status, body) = send(
        &router,
        as_user("GET", "/api/tasks", alice.id, "Nigeria", "user", None)
    ).await;
    assert_eq!(status, StatusCode::OK);

    let tasks: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(tasks.len(), 2);
    for task in &tasks {
        assert_eq!(task["completed"], task["id"] == json!(done.id));
    }
}

#[tokio::test]
async fn test_withdrawal_over_http() {
    let (db, state, router) = app().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;
    for task_id in 1..=5 {
        let uri = format!("/api/postback?user_id={}&task_id={}&payout=5", alice.id, task_id);
        send(&router, get(&uri)).await;
    }

    let (status, body) = send(
        &router,
        as_user(
            "POST",
            "/api/withdrawals",
            alice.id,
            "Nigeria",
            "user",
            Some(json!({ "amount": "10.00", "wallet_address": "TXYZ", "network": "TRC20" }))
        )
    ).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(error["error"]["code"], "INVALID_INPUT");

    let (status, body) = send(
        &router,
        as_user(
            "POST",
            "/api/withdrawals",
            alice.id,
            "Nigeria",
            "user",
            Some(json!({ "amount": "20.00", "wallet_address": "TXYZ", "network": "trc20" }))
        )
    ).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["status"], "pending");
    assert_eq!(common::reload_user(&db, alice.id).await.balance_task_cents, 500);

    let uri = format!("/api/admin/withdrawals/{}", created["id"]);
    let (status, body) = send(
        &router,
        as_user("PATCH", &uri, 1, "Nigeria", "admin", Some(json!({ "status": "rejected" })))
    ).await;
    assert_eq!(status, StatusCode::OK);
    let reviewed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(reviewed["status"], "rejected");
    assert_eq!(common::reload_user(&db, alice.id).await.balance_task_cents, 2500);
}

#[tokio::test]
async fn test_announcements_by_country() {
    let (_db, state, router) = app().await;
    let alice = common::register(&state, "alice", "Nigeria", None).await;

    for (content, country) in [
        ("Welcome", None),
        ("Nigeria bonus week", Some("Nigeria")),
        ("Ghana bonus week", Some("Ghana")),
    ] {
        let (status, _) = send(
            &router,
            as_user(
                "POST",
                "/api/admin/announcements",
                1,
                "Nigeria",
                "admin",
                Some(json!({ "content": content, "country": country }))
            )
        ).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &router,
        as_user("GET", "/api/announcements", alice.id, "Nigeria", "user", None)
    ).await;
    assert_eq!(status, StatusCode::OK);

    let announcements: Vec<Value> = serde_json::from_str(&body).unwrap();
    let contents: Vec<&str> = announcements
        .iter()
        .filter_map(|a| a["content"].as_str())
        .collect();
    assert_eq!(contents.len(), 2);
    assert!(contents.contains(&"Welcome"));
    assert!(contents.contains(&"Nigeria bonus week"));
}
