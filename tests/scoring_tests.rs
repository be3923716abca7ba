// tests/scoring_tests.rs
//
// End-to-end quiz submission and scoring. Requires a running Postgres
// (DATABASE_URL); run with `cargo test -- --ignored`.

use std::net::SocketAddr;
use std::sync::Arc;

use quiz_backend::cache::ResponseCache;
use quiz_backend::utils::image::Cloudinary;
use quiz_backend::{config::Config, routes, state::AppState};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

async fn spawn_app() -> (String, PgPool) {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "scoring_test_secret".to_string(),
        jwt_expiration: 600,
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
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
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

/// Inserts a category with three questions and a quiz pointing at it.
/// Returns (quiz_id, question_ids).
async fn seed_quiz_fixture(pool: &PgPool) -> (i64, Vec<i64>) {
    let category_id: i64 =
        sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING id")
            .bind(format!("cat_{}", &uuid::Uuid::new_v4().to_string()[..8]))
            .fetch_one(pool)
            .await
            .unwrap();

    let mut question_ids = Vec::new();
    for (content, answer) in [("1 + 1 = ?", "A"), ("2 + 2 = ?", "B"), ("3 + 3 = ?", "C")] {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO questions (category_id, content, options, answer)
            VALUES ($1, $2, '["A", "B", "C"]', $3)
            RETURNING id
            "#,
        )
        .bind(category_id)
        .bind(content)
        .bind(answer)
        .fetch_one(pool)
        .await
        .unwrap();
        question_ids.push(id);
    }

    let quiz_id: i64 = sqlx::query_scalar(
        "INSERT INTO quizzes (category_id, title) VALUES ($1, 'Arithmetic') RETURNING id",
    )
    .bind(category_id)
    .fetch_one(pool)
    .await
    .unwrap();

    (quiz_id, question_ids)
}

async fn user_token(address: &str, client: &reqwest::Client) -> String {
    let email = format!("scorer_{}@test.local", &uuid::Uuid::new_v4().to_string()[..8]);
    let body: serde_json::Value = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "fullName": "Quiz Taker",
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn submit_scores_and_resubmit_increments_attempts() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (quiz_id, qids) = seed_quiz_fixture(&pool).await;
    let token = user_token(&address, &client).await;

    // First attempt: two of three correct.
    let body: serde_json::Value = client
        .post(format!("{}/api/quizzes/submit", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "quizId": quiz_id,
            "answers": {
                qids[0].to_string(): "A",
                qids[1].to_string(): "X",
                qids[2].to_string(): "C",
            }
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["score"], 2);
    assert_eq!(body["attempts"], 1);
    assert_eq!(body["totalQuestions"], 3);

    // Resubmission overwrites the score and bumps attempts.
    let body: serde_json::Value = client
        .post(format!("{}/api/quizzes/submit", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "quizId": quiz_id,
            "answers": {
                qids[0].to_string(): "A",
                qids[1].to_string(): "B",
                qids[2].to_string(): "C",
            }
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["score"], 3);
    assert_eq!(body["attempts"], 2);

    // One record per (user, quiz), reflecting the latest attempt.
    let records: serde_json::Value = client
        .get(format!("{}/api/quiz-records", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mine: Vec<&serde_json::Value> = records["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["quizId"] == quiz_id)
        .collect();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["score"], 3);
    assert_eq!(mine[0]["attempts"], 2);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn submit_rejects_unknown_and_invalid_quiz_ids() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let token = user_token(&address, &client).await;

    let response = client
        .post(format!("{}/api/quizzes/submit", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"quizId": -1, "answers": {}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .post(format!("{}/api/quizzes/submit", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({"quizId": 99_999_999, "answers": {}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn unanswered_and_unknown_questions_score_zero() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (quiz_id, qids) = seed_quiz_fixture(&pool).await;
    let token = user_token(&address, &client).await;

    // One correct answer, one unknown question id, one unanswered.
    let body: serde_json::Value = client
        .post(format!("{}/api/quizzes/submit", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "quizId": quiz_id,
            "answers": {
                qids[0].to_string(): "A",
                "999999": "B",
            }
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["score"], 1);
    assert_eq!(body["totalQuestions"], 3);
}
