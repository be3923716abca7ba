// src/handlers/quiz.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, State},
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
        question::PublicQuestion,
        quiz::{CreateQuizRequest, Quiz, QuizListItem, SubmitQuizRequest, UpdateQuizRequest},
    },
    state::AppState,
    utils::{image::delete_image_best_effort, jwt::Claims},
};

const IMAGE_FOLDER: &str = "QuizzesImg";

/// Helper struct for fetching answer keys from the database.
#[derive(sqlx::FromRow)]
struct AnswerKey {
    id: i64,
    answer: String,
}

/// Scores a submission against the answer keys of a quiz's question set.
///
/// Answers are keyed by question id, so scoring is independent of the
/// order the store returns questions in. An unanswered or unknown
/// question scores zero. The result is always in [0, keys.len()].
fn score_answers(answers: &HashMap<i64, String>, keys: &[AnswerKey]) -> i64 {
    keys.iter()
        .filter(|key| answers.get(&key.id) == Some(&key.answer))
        .count() as i64
}

/// Lists all quizzes, with foreign keys and internals excluded.
pub async fn list_quizzes(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let quizzes = sqlx::query_as::<_, QuizListItem>(
        r#"
        SELECT id, title, quiz_time, description, status, image_url
        FROM quizzes
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Quizzes fetched successfully",
        "totalQuizzes": quizzes.len(),
        "data": quizzes,
    })))
}

/// Retrieves a single quiz by ID.
pub async fn get_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = sqlx::query_as::<_, QuizListItem>(
        r#"
        SELECT id, title, quiz_time, description, status, image_url
        FROM quizzes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Quiz fetched successfully",
        "data": quiz,
    })))
}

/// Retrieves the quiz attached to a chapter, with its question set joined
/// in through the shared category. Answers are stripped from the payload.
pub async fn get_quiz_by_chapter(
    State(state): State<AppState>,
    Path(chapter_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        SELECT id, class_id, subject_id, chapter_id, category_id, title, quiz_time,
               description, status, image_url, public_id, created_at
        FROM quizzes
        WHERE chapter_id = $1
        LIMIT 1
        "#,
    )
    .bind(chapter_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound(
        "No quiz found for this chapter".to_string(),
    ))?;

    let questions = sqlx::query_as::<_, PublicQuestion>(
        r#"
        SELECT id, content, options, question_type
        FROM questions
        WHERE category_id = $1
        ORDER BY id
        "#,
    )
    .bind(quiz.category_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Quiz retrieved successfully",
        "data": {
            "quiz": quiz,
            "questions": questions,
        },
    })))
}

/// Submits a user's quiz answers and calculates the score.
///
/// * Resolves the quiz, then its question set via the category join.
/// * Scores by question id (order-independent).
/// * Upserts the (user, quiz) record: the score and timestamp are
///   overwritten, attempts is incremented inside the same statement so
///   concurrent resubmissions never lose an increment.
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.quiz_id <= 0 {
        return Err(AppError::BadRequest("Invalid quiz id".to_string()));
    }

    let category_id: Option<i64> =
        sqlx::query_scalar("SELECT category_id FROM quizzes WHERE id = $1")
            .bind(req.quiz_id)
            .fetch_optional(&state.pool)
            .await?;

    let category_id = category_id.ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let keys: Vec<AnswerKey> =
        sqlx::query_as("SELECT id, answer FROM questions WHERE category_id = $1")
            .bind(category_id)
            .fetch_all(&state.pool)
            .await?;

    if keys.is_empty() {
        return Err(AppError::NotFound(
            "No questions found for this category".to_string(),
        ));
    }

    let score = score_answers(&req.answers, &keys);

    let user_id = claims.user_id();

    let (score, attempts): (i64, i64) = sqlx::query_as(
        r#"
        INSERT INTO quiz_records (user_id, quiz_id, score, attempts, attempted_at)
        VALUES ($1, $2, $3, 1, now())
        ON CONFLICT (user_id, quiz_id) DO UPDATE SET
            score = EXCLUDED.score,
            attempted_at = EXCLUDED.attempted_at,
            attempts = quiz_records.attempts + 1
        RETURNING score, attempts
        "#,
    )
    .bind(user_id)
    .bind(req.quiz_id)
    .bind(score)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to upsert quiz record: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    state.cache.invalidate_resource(Resource::QuizRecords);

    Ok(Json(json!({
        "success": true,
        "message": "Quiz submitted successfully",
        "score": score,
        "attempts": attempts,
        "totalQuestions": keys.len(),
    })))
}

/// Creates a new quiz.
/// Admin only.
pub async fn create_quiz(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let image = state
        .images
        .upload(&payload.image_url, IMAGE_FOLDER, 220, 200)
        .await?;

    let quiz = sqlx::query_as::<_, Quiz>(
        r#"
        INSERT INTO quizzes
        (class_id, subject_id, chapter_id, category_id, title, quiz_time, description, status,
         image_url, public_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, class_id, subject_id, chapter_id, category_id, title, quiz_time,
                  description, status, image_url, public_id, created_at
        "#,
    )
    .bind(payload.class_id)
    .bind(payload.subject_id)
    .bind(payload.chapter_id)
    .bind(payload.category_id)
    .bind(&payload.title)
    .bind(payload.quiz_time)
    .bind(&payload.description)
    .bind(payload.status.as_deref().unwrap_or("active"))
    .bind(&image.url)
    .bind(&image.public_id)
    .fetch_one(&state.pool)
    .await?;

    state.cache.invalidate_resource(Resource::Quizzes);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Quiz created successfully",
            "data": quiz,
        })),
    ))
}

/// Updates a quiz by ID.
/// Admin only.
pub async fn update_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.class_id.is_none()
        && payload.subject_id.is_none()
        && payload.chapter_id.is_none()
        && payload.category_id.is_none()
        && payload.title.is_none()
        && payload.quiz_time.is_none()
        && payload.description.is_none()
        && payload.status.is_none()
        && payload.image_url.is_none()
    {
        return Err(AppError::BadRequest("No updates provided".to_string()));
    }

    let image = match &payload.image_url {
        Some(source) => {
            let old: Option<(Option<String>,)> =
                sqlx::query_as("SELECT public_id FROM quizzes WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&state.pool)
                    .await?;
            let (old_public_id,) = old.ok_or(AppError::NotFound("Quiz not found".to_string()))?;
            delete_image_best_effort(state.images.as_ref(), old_public_id.as_deref()).await;
            Some(state.images.upload(source, IMAGE_FOLDER, 220, 200).await?)
        }
        None => None,
    };

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE quizzes SET ");
    let mut separated = builder.separated(", ");

    if let Some(class_id) = payload.class_id {
        separated.push("class_id = ");
        separated.push_bind_unseparated(class_id);
    }

    if let Some(subject_id) = payload.subject_id {
        separated.push("subject_id = ");
        separated.push_bind_unseparated(subject_id);
    }

    if let Some(chapter_id) = payload.chapter_id {
        separated.push("chapter_id = ");
        separated.push_bind_unseparated(chapter_id);
    }

    if let Some(category_id) = payload.category_id {
        separated.push("category_id = ");
        separated.push_bind_unseparated(category_id);
    }

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title);
    }

    if let Some(quiz_time) = payload.quiz_time {
        separated.push("quiz_time = ");
        separated.push_bind_unseparated(quiz_time);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    if let Some(status) = payload.status {
        separated.push("status = ");
        separated.push_bind_unseparated(status);
    }

    if let Some(image) = image {
        separated.push("image_url = ");
        separated.push_bind_unseparated(image.url);
        separated.push("public_id = ");
        separated.push_bind_unseparated(image.public_id);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&state.pool).await.map_err(|e| {
        tracing::error!("Failed to update quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    state.cache.invalidate_resource(Resource::Quizzes);

    Ok(Json(json!({
        "success": true,
        "message": "Quiz updated successfully",
    })))
}

/// Deletes a quiz by ID.
/// Admin only.
pub async fn delete_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted: Option<(Option<String>,)> =
        sqlx::query_as("DELETE FROM quizzes WHERE id = $1 RETURNING public_id")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;

    let (public_id,) = deleted.ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    delete_image_best_effort(state.images.as_ref(), public_id.as_deref()).await;

    state.cache.invalidate_resource(Resource::Quizzes);

    Ok(Json(json!({
        "success": true,
        "message": "Quiz deleted successfully",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(pairs: &[(i64, &str)]) -> Vec<AnswerKey> {
        pairs
            .iter()
            .map(|(id, answer)| AnswerKey {
                id: *id,
                answer: answer.to_string(),
            })
            .collect()
    }

    fn answers(pairs: &[(i64, &str)]) -> HashMap<i64, String> {
        pairs
            .iter()
            .map(|(id, answer)| (*id, answer.to_string()))
            .collect()
    }

    #[test]
    fn counts_matching_answers() {
        let keys = keys(&[(1, "A"), (2, "B"), (3, "C")]);

        let two_right = answers(&[(1, "A"), (2, "X"), (3, "C")]);
        assert_eq!(score_answers(&two_right, &keys), 2);

        let all_right = answers(&[(1, "A"), (2, "B"), (3, "C")]);
        assert_eq!(score_answers(&all_right, &keys), 3);
    }

    #[test]
    fn scoring_is_order_independent() {
        let keys = keys(&[(1, "A"), (2, "B"), (3, "C")]);
        // Same answers submitted "out of order" (map entries have no order).
        let shuffled = answers(&[(3, "C"), (1, "A"), (2, "B")]);
        assert_eq!(score_answers(&shuffled, &keys), 3);
    }

    #[test]
    fn missing_and_unknown_answers_score_zero() {
        let keys = keys(&[(1, "A"), (2, "B")]);

        let partial = answers(&[(1, "A")]);
        assert_eq!(score_answers(&partial, &keys), 1);

        let unknown_ids = answers(&[(99, "A"), (100, "B")]);
        assert_eq!(score_answers(&unknown_ids, &keys), 0);

        assert_eq!(score_answers(&HashMap::new(), &keys), 0);
    }

    #[test]
    fn score_is_bounded_by_question_count() {
        let keys = keys(&[(1, "A")]);
        // Extra submitted answers cannot push the score past the key count.
        let extra = answers(&[(1, "A"), (2, "A"), (3, "A")]);
        assert_eq!(score_answers(&extra, &keys), 1);
    }
}
