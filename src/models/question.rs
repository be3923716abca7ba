// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,

    /// The join key to quizzes: a quiz's question set is every question
    /// sharing its category.
    pub category_id: i64,

    /// The text content of the question.
    pub content: String,

    /// List of options (e.g., ["Option A", "Option B"]).
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// The correct answer key or content.
    pub answer: String,

    /// Question type: 'single' (single choice) or 'multiple' (multiple choice).
    pub question_type: String,

    pub status: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for sending a question to quiz takers (excludes the answer).
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub content: String,
    pub options: Json<Vec<String>>,
    pub question_type: String,
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub category_id: i64,
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
    #[validate(length(min = 1, max = 20))]
    pub question_type: String,
    pub status: Option<String>,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    pub category_id: Option<i64>,
    pub content: Option<String>,
    pub options: Option<Vec<String>>,
    pub answer: Option<String>,
    pub question_type: Option<String>,
    pub status: Option<String>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("options_cannot_be_empty"));
    }
    for opt in options {
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}
