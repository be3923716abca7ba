// tests/api_tests.rs
//
// These tests run against a real Postgres instance (DATABASE_URL) and are
// ignored by default: `cargo test -- --ignored` with a database running.

use std::net::SocketAddr;
use std::sync::Arc;

use quiz_backend::cache::ResponseCache;
use quiz_backend::utils::image::Cloudinary;
use quiz_backend::{config::Config, routes, state::AppState};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL and a pool for direct database fixtures.
async fn spawn_app() -> (String, PgPool) {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        port: 0,
        cache_capacity: 64,
        admin_email: None,
        admin_password: None,
        cloudinary: None,
    };

    let state = AppState {
        pool: pool.clone(),
        cache: Arc::new(ResponseCache::new(config.cache_capacity)),
        images: Arc::new(Cloudinary::new(None)),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    (address, pool)
}

fn unique_email(prefix: &str) -> String {
    format!(
        "{}_{}@test.local",
        prefix,
        &uuid::Uuid::new_v4().to_string()[..8]
    )
}

/// Registers a fresh user and returns (email, token).
async fn register_user(address: &str, client: &reqwest::Client) -> (String, String) {
    let email = unique_email("user");
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "fullName": "Test User",
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    (email, token)
}

/// Registers a user, promotes it to admin directly in the database, and
/// logs in again so the token carries the admin role.
async fn admin_token(address: &str, client: &reqwest::Client, pool: &PgPool) -> String {
    let (email, _) = register_user(address, client).await;

    sqlx::query("UPDATE users SET role = 'admin' WHERE email = $1")
        .bind(&email)
        .execute(pool)
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"email": email, "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn unknown_path_is_404() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn register_and_login_work() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (email, _token) = register_user(&address, &client).await;

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"email": email, "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some());
    // The password hash must never appear in any payload.
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn register_fails_validation() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    // Password too short.
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "fullName": "Test User",
            "email": unique_email("short"),
            "password": "123"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn duplicate_email_is_conflict() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (email, _token) = register_user(&address, &client).await;

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "fullName": "Someone Else",
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn content_routes_require_auth() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/classes", address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn mutations_require_admin_role() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (_email, token) = register_user(&address, &client).await;

    let response = client
        .post(format!("{}/api/classes", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"name": "Forbidden Class"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn class_crud_flow() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&address, &client, &pool).await;

    // Create
    let created: serde_json::Value = client
        .post(format!("{}/api/classes", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"name": "Grade 10", "description": "Tenth grade"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(created["success"], true);
    let id = created["data"]["id"].as_i64().unwrap();

    // Read back
    let fetched: serde_json::Value = client
        .get(format!("{}/api/classes/{}", address, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["data"]["name"], "Grade 10");

    // Update
    let response = client
        .put(format!("{}/api/classes/{}", address, id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"name": "Grade 10 (Science)"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // Delete
    let response = client
        .delete(format!("{}/api/classes/{}", address, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // Gone
    let response = client
        .get(format!("{}/api/classes/{}", address, id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn cached_listing_reflects_mutations() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&address, &client, &pool).await;

    let name_a = format!("Cache Class {}", &uuid::Uuid::new_v4().to_string()[..8]);
    client
        .post(format!("{}/api/classes", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"name": name_a}))
        .send()
        .await
        .unwrap();

    // Prime the cache.
    let first: serde_json::Value = client
        .get(format!("{}/api/classes", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        first["data"]
            .as_array()
            .unwrap()
            .iter()
            .any(|c| c["name"] == name_a.as_str())
    );

    // Mutate: the listing key must be invalidated, not served stale.
    let name_b = format!("Cache Class {}", &uuid::Uuid::new_v4().to_string()[..8]);
    client
        .post(format!("{}/api/classes", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"name": name_b}))
        .send()
        .await
        .unwrap();

    let second: serde_json::Value = client
        .get(format!("{}/api/classes", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(
        second["data"]
            .as_array()
            .unwrap()
            .iter()
            .any(|c| c["name"] == name_b.as_str())
    );
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn cached_chapter_quiz_reflects_question_mutations() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&address, &client, &pool).await;

    let post = |path: &str, body: serde_json::Value| {
        client
            .post(format!("{}{}", address, path))
            .header("Authorization", format!("Bearer {}", token))
            .json(&body)
            .send()
    };

    // Build the class -> subject -> chapter hierarchy and a quiz whose
    // question set comes from its category.
    let class: serde_json::Value = post("/api/classes", serde_json::json!({"name": "Grade 8"}))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let class_id = class["data"]["id"].as_i64().unwrap();

    let subject: serde_json::Value = post(
        "/api/subjects",
        serde_json::json!({"classId": class_id, "name": "Physics"}),
    )
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    let subject_id = subject["data"]["id"].as_i64().unwrap();

    let chapter: serde_json::Value = post(
        "/api/chapters",
        serde_json::json!({
            "subjectId": subject_id,
            "name": "Motion",
            "imageUrl": "https://img.test.local/motion.png"
        }),
    )
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    let chapter_id = chapter["data"]["id"].as_i64().unwrap();

    let category: serde_json::Value =
        post("/api/categories", serde_json::json!({"name": "Motion MCQ"}))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
    let category_id = category["data"]["id"].as_i64().unwrap();

    post(
        "/api/quizzes",
        serde_json::json!({
            "chapterId": chapter_id,
            "categoryId": category_id,
            "title": "Motion Quiz",
            "quizTime": 300,
            "imageUrl": "https://img.test.local/quiz.png"
        }),
    )
    .await
    .unwrap();

    post(
        "/api/questions",
        serde_json::json!({
            "categoryId": category_id,
            "content": "What is velocity?",
            "options": ["Speed", "Speed with direction"],
            "answer": "Speed with direction",
            "questionType": "single"
        }),
    )
    .await
    .unwrap();

    // Prime the cached quiz-by-chapter view.
    let first: serde_json::Value = client
        .get(format!("{}/api/quizzes/chapter/{}", address, chapter_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["data"]["questions"].as_array().unwrap().len(), 1);

    // A question mutation must evict the embedded view, not leave it stale.
    post(
        "/api/questions",
        serde_json::json!({
            "categoryId": category_id,
            "content": "Unit of force?",
            "options": ["Newton", "Joule"],
            "answer": "Newton",
            "questionType": "single"
        }),
    )
    .await
    .unwrap();

    let second: serde_json::Value = client
        .get(format!("{}/api/quizzes/chapter/{}", address, chapter_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["data"]["questions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn settings_roundtrip_and_validation() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&address, &client, &pool).await;

    // Unknown kind is rejected.
    let response = client
        .put(format!("{}/api/settings/bogus", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"anything": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Valid payload upserts the singleton for its kind.
    let response = client
        .put(format!("{}/api/settings/privacy-policy", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"policy": "We collect nothing."}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let fetched: serde_json::Value = client
        .get(format!("{}/api/settings/privacy-policy", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["data"]["policy"], "We collect nothing.");
}
