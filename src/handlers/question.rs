// src/handlers/question.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    cache::Resource,
    error::AppError,
    models::{
        PageParams,
        question::{CreateQuestionRequest, Question, UpdateQuestionRequest},
    },
    state::AppState,
};

/// Lists questions, paginated.
/// Admin only; includes answers.
pub async fn list_questions(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, category_id, content, options, answer, question_type, status, created_at
        FROM questions
        ORDER BY created_at DESC
        OFFSET $1 LIMIT $2
        "#,
    )
    .bind(params.offset())
    .bind(params.limit())
    .fetch_all(&state.pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions")
        .fetch_one(&state.pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Questions fetched successfully",
        "totalQuestions": total,
        "totalPages": params.total_pages(total),
        "currentPage": params.page(),
        "data": questions,
    })))
}

/// Retrieves a single question by ID.
/// Admin only.
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, category_id, content, options, answer, question_type, status, created_at
        FROM questions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Question fetched successfully",
        "data": question,
    })))
}

/// Creates a new question under a category.
/// Admin only.
pub async fn create_question(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let options_json = serde_json::to_value(&payload.options)?;

    let question = sqlx::query_as::<_, Question>(
        r#"
        INSERT INTO questions (category_id, content, options, answer, question_type, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, category_id, content, options, answer, question_type, status, created_at
        "#,
    )
    .bind(payload.category_id)
    .bind(&payload.content)
    .bind(options_json)
    .bind(&payload.answer)
    .bind(&payload.question_type)
    .bind(payload.status.as_deref().unwrap_or("active"))
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    state.cache.invalidate_resource(Resource::Questions);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Question created successfully",
            "data": question,
        })),
    ))
}

/// Updates a question by ID.
/// Admin only.
pub async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.category_id.is_none()
        && payload.content.is_none()
        && payload.options.is_none()
        && payload.answer.is_none()
        && payload.question_type.is_none()
        && payload.status.is_none()
    {
        return Err(AppError::BadRequest("No updates provided".to_string()));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE questions SET ");
    let mut separated = builder.separated(", ");

    if let Some(category_id) = payload.category_id {
        separated.push("category_id = ");
        separated.push_bind_unseparated(category_id);
    }

    if let Some(content) = payload.content {
        separated.push("content = ");
        separated.push_bind_unseparated(content);
    }

    if let Some(options) = payload.options {
        separated.push("options = ");
        separated.push_bind_unseparated(serde_json::to_value(options)?);
    }

    if let Some(answer) = payload.answer {
        separated.push("answer = ");
        separated.push_bind_unseparated(answer);
    }

    if let Some(question_type) = payload.question_type {
        separated.push("question_type = ");
        separated.push_bind_unseparated(question_type);
    }

    if let Some(status) = payload.status {
        separated.push("status = ");
        separated.push_bind_unseparated(status);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&state.pool).await.map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    state.cache.invalidate_resource(Resource::Questions);

    Ok(Json(json!({
        "success": true,
        "message": "Question updated successfully",
    })))
}

/// Deletes a question by ID.
/// Admin only.
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    state.cache.invalidate_resource(Resource::Questions);

    Ok(Json(json!({
        "success": true,
        "message": "Question deleted successfully",
    })))
}
