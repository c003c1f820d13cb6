// tests/api_tests.rs

use quiz_backend::{
    config::Config, handlers::auth::insert_user, routes, scoring::RemediationCatalog,
    state::AppState,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;

const ADMIN_USERNAME: &str = "admin_root";
const ADMIN_PASSWORD: &str = "admin_password";

/// Helper function to spawn the app on a random port for testing.
/// Each call gets its own in-memory database with an admin user seeded.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // A single connection that never expires keeps the in-memory database alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    insert_user(&pool, "Admin", ADMIN_USERNAME, ADMIN_PASSWORD, "admin")
        .await
        .expect("Failed to seed admin");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        server_port: 0,
        questions_per_attempt: 30,
        remediation_catalog: None,
        admin_username: None,
        admin_password: None,
    };

    let state = AppState {
        pool,
        config,
        remediation: Arc::new(RemediationCatalog::default()),
    };

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

async fn login(client: &reqwest::Client, address: &str, username: &str, password: &str) -> String {
    let resp = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"username": username, "password": password}))
        .send()
        .await
        .expect("Login failed");
    assert_eq!(resp.status().as_u16(), 200);

    let body: serde_json::Value = resp.json().await.expect("Failed to parse login json");
    body["token"].as_str().expect("Token not found").to_string()
}

async fn register_and_login(client: &reqwest::Client, address: &str, username: &str) -> String {
    let resp = client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Test Student",
            "username": username,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(resp.status().as_u16(), 201);

    login(client, address, username, "password123").await
}

#[tokio::test]
async fn unknown_path_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_works_and_hides_password() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let username = unique_name("u");

    let response = client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Ada",
            "username": username,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["username"], username.as_str());
    assert_eq!(body["role"], "user");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn register_duplicate_is_conflict() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Imposter",
            "username": ADMIN_USERNAME,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn register_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Username too short
    let response = client
        .post(&format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Yo",
            "username": "yo",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    for (username, password) in [(ADMIN_USERNAME, "wrong_password"), ("nobody_here", "password123")] {
        let response = client
            .post(&format!("{}/api/auth/login", address))
            .json(&serde_json::json!({"username": username, "password": password}))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status().as_u16(), 401);
    }
}

#[tokio::test]
async fn me_requires_token_and_reports_profile() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let anonymous = client
        .get(&format!("{}/api/users/me", address))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    let forged = client
        .get(&format!("{}/api/users/me", address))
        .header("Authorization", "Bearer not.a.token")
        .send()
        .await
        .unwrap();
    assert_eq!(forged.status().as_u16(), 401);

    let username = unique_name("me");
    let token = register_and_login(&client, &address, &username).await;

    let me: serde_json::Value = client
        .get(&format!("{}/api/users/me", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(me["username"], username.as_str());
    assert_eq!(me["name"], "Test Student");
    assert_eq!(me["latest_score"], 0);
    assert_eq!(me["attempt_count"], 0);
}

#[tokio::test]
async fn admin_routes_require_admin_role() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &address, &unique_name("u")).await;

    let response = client
        .get(&format!("{}/api/admin/users", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn admin_manages_users() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = login(&client, &address, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    // Create a user with an explicit role
    let created = client
        .post(&format!("{}/api/admin/users", address))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&serde_json::json!({
            "name": "Grace",
            "username": "grace_h",
            "password": "password123",
            "role": "user"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let new_id = created.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();

    // Invalid role is rejected
    let bad_role = client
        .post(&format!("{}/api/admin/users", address))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&serde_json::json!({
            "name": "Mallory",
            "username": "mallory",
            "password": "password123",
            "role": "superuser"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_role.status().as_u16(), 400);

    let users: Vec<serde_json::Value> = client
        .get(&format!("{}/api/admin/users", address))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.len(), 2);
    assert!(users.iter().all(|u| u.get("password").is_none()));

    let admin_id = users
        .iter()
        .find(|u| u["username"] == ADMIN_USERNAME)
        .and_then(|u| u["id"].as_i64())
        .unwrap();

    // Self-deletion is refused
    let self_delete = client
        .delete(&format!("{}/api/admin/users/{}", address, admin_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap();
    assert_eq!(self_delete.status().as_u16(), 400);

    let deleted = client
        .delete(&format!("{}/api/admin/users/{}", address, new_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    let again = client
        .delete(&format!("{}/api/admin/users/{}", address, new_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 404);
}

#[tokio::test]
async fn malformed_body_is_json_bad_request() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Wrong field type, which axum's own extractor would answer with 422
    let wrong_type = client
        .post(&format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"username": ADMIN_USERNAME, "password": 42}))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_type.status().as_u16(), 400);
    let body: serde_json::Value = wrong_type.json().await.unwrap();
    assert!(body["error"].is_string());

    // Missing content type
    let no_content_type = client
        .post(&format!("{}/api/auth/register", address))
        .body(r#"{"name":"Ada","username":"ada_l","password":"password123"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(no_content_type.status().as_u16(), 400);
    let body: serde_json::Value = no_content_type.json().await.unwrap();
    assert!(body["error"].is_string());
}

