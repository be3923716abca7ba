// src/handlers/records.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::quiz_record::{QuizReportEntry, UserQuizRecord},
    state::AppState,
    utils::jwt::Claims,
};

/// Returns the authenticated user's quiz records, newest first, with quiz
/// titles joined in.
pub async fn list_my_records(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let records = sqlx::query_as::<_, UserQuizRecord>(
        r#"
        SELECT r.quiz_id, q.title AS quiz_title, r.score, r.attempts, r.attempted_at
        FROM quiz_records r
        JOIN quizzes q ON r.quiz_id = q.id
        WHERE r.user_id = $1
        ORDER BY r.attempted_at DESC
        "#,
    )
    .bind(claims.user_id())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Quiz records fetched successfully",
        "totalRecords": records.len(),
        "data": records,
    })))
}

/// Returns the leaderboard-style report for one quiz: every participant
/// with their name, score and attempts, best score first.
/// Admin only.
pub async fn quiz_report(
    State(state): State<AppState>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_title: Option<String> = sqlx::query_scalar("SELECT title FROM quizzes WHERE id = $1")
        .bind(quiz_id)
        .fetch_optional(&state.pool)
        .await?;

    let quiz_title = quiz_title.ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let entries = sqlx::query_as::<_, QuizReportEntry>(
        r#"
        SELECT r.user_id, u.full_name, r.score, r.attempts, r.attempted_at
        FROM quiz_records r
        JOIN users u ON r.user_id = u.id
        WHERE r.quiz_id = $1
        ORDER BY r.score DESC, r.attempted_at ASC
        "#,
    )
    .bind(quiz_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Quiz report fetched successfully",
        "quizTitle": quiz_title,
        "totalParticipants": entries.len(),
        "data": entries,
    })))
}
