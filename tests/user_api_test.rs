use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use small_backoffice::adapters::{db, http};
use small_backoffice::config::DatabaseConfig;
use small_backoffice::UserService;
use tower::ServiceExt;

async fn setup() -> (UserService, Router) {
    let pool = db::connect(&DatabaseConfig::in_memory()).await.unwrap();
    let users = UserService::new(pool);
    let router = http::build_router(users.clone());
    (users, router)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let (_users, router) = setup().await;
    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_missing_user_is_not_found() {
    let (_users, router) = setup().await;

    let (status, body) = get(&router, "/users?id=999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "not_found");
    assert_eq!(body["message"], "User not found");
    assert!(!body.to_string().contains("password"));
}

#[tokio::test]
async fn test_get_existing_user_hides_password() {
    let (users, router) = setup().await;
    let created = users.create_user("alice", "alice@example.com").await.unwrap();

    let (status, body) = get(&router, &format!("/users?id={}", created.id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_get_user_with_bad_id() {
    let (_users, router) = setup().await;

    let (status, body) = get(&router, "/users?id=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let (status, _) = get(&router, "/users").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_user() {
    let (users, router) = setup().await;

    let (status, body) = get(&router, "/create_user?name=bob&email=bob%40example.com").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "created");
    assert_eq!(body["user"]["username"], "bob");
    assert_eq!(users.count_users().await.unwrap(), 1);

    let id = body["user"]["id"].as_i64().unwrap();
    let (status, body) = get(&router, &format!("/users?id={id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "bob@example.com");
}

#[tokio::test]
async fn test_create_user_invalid_email_writes_nothing() {
    let (users, router) = setup().await;

    let (status, body) = get(&router, "/create_user?name=bob&email=bob.example.com").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("Invalid email"));
    assert_eq!(users.count_users().await.unwrap(), 0);

    let (status, _) = get(&router, "/create_user?name=bob").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(users.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn test_create_duplicate_user_conflicts() {
    let (_users, router) = setup().await;

    let (status, _) = get(&router, "/create_user?name=bob&email=bob%40example.com").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = get(&router, "/create_user?name=bob&email=other%40example.com").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "error");
}
