// src/handlers/dashboard.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::{error::AppError, models::user::UserListItem, state::AppState};

/// Aggregated entity counts for the admin dashboard.
/// Admin only.
pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let (users, classes, subjects, chapters, categories, quizzes, questions): (
        i64,
        i64,
        i64,
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users WHERE role = 'user'),
            (SELECT COUNT(*) FROM classes),
            (SELECT COUNT(*) FROM subjects),
            (SELECT COUNT(*) FROM chapters),
            (SELECT COUNT(*) FROM categories),
            (SELECT COUNT(*) FROM quizzes),
            (SELECT COUNT(*) FROM questions)
        "#,
    )
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Dashboard stats fetched successfully",
        "data": {
            "totalUsers": users,
            "totalClasses": classes,
            "totalSubjects": subjects,
            "totalChapters": chapters,
            "totalCategories": categories,
            "totalQuizzes": quizzes,
            "totalQuestions": questions,
        },
    })))
}

/// The five most recently registered users.
/// Admin only.
pub async fn new_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, UserListItem>(
        r#"
        SELECT u.id, u.full_name, u.email, u.mobile, u.role, u.profile_url,
               c.name AS class_name, u.created_at
        FROM users u
        LEFT JOIN classes c ON u.class_id = c.id
        WHERE u.role = 'user'
        ORDER BY u.created_at DESC
        LIMIT 5
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "New users fetched successfully",
        "data": users,
    })))
}
