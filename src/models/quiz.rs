// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'quizzes' table in the database.
///
/// A quiz owns no questions directly; its question set is resolved by
/// matching `category_id` against the questions table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub class_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub chapter_id: Option<i64>,
    pub category_id: i64,
    pub title: String,
    /// Time limit in seconds. Zero means untimed.
    pub quiz_time: i64,
    pub description: Option<String>,
    pub status: String,
    pub image_url: Option<String>,
    #[serde(skip)]
    pub public_id: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Slim listing row: foreign keys and internals excluded.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizListItem {
    pub id: i64,
    pub title: String,
    pub quiz_time: i64,
    pub description: Option<String>,
    pub status: String,
    pub image_url: Option<String>,
}

/// DTO for creating a quiz. An image source URL is required.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    pub class_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub chapter_id: Option<i64>,
    pub category_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(range(min = 0))]
    pub quiz_time: i64,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub status: Option<String>,
    #[validate(length(min = 1, message = "An image is required."))]
    pub image_url: String,
}

/// DTO for updating a quiz. Fields are optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuizRequest {
    pub class_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub chapter_id: Option<i64>,
    pub category_id: Option<i64>,
    pub title: Option<String>,
    pub quiz_time: Option<i64>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub image_url: Option<String>,
}

/// DTO for submitting a quiz attempt.
///
/// Answers are keyed by question id rather than array position, so the
/// submission is independent of the order the store returns questions in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    pub quiz_id: i64,
    /// Question ID -> selected answer.
    pub answers: std::collections::HashMap<i64, String>,
}
