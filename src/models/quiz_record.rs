// src/models/quiz_record.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'quiz_records' table in the database.
///
/// One row per (user, quiz) pair: a resubmission overwrites the score and
/// timestamp and bumps the attempts counter. Only the most recent attempt
/// is retained, not a history.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRecord {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub score: i64,
    pub attempts: i64,
    pub attempted_at: chrono::DateTime<chrono::Utc>,
}

/// A user's record with the quiz title joined in.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserQuizRecord {
    pub quiz_id: i64,
    pub quiz_title: String,
    pub score: i64,
    pub attempts: i64,
    pub attempted_at: chrono::DateTime<chrono::Utc>,
}

/// A per-quiz report row, ordered by score.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizReportEntry {
    pub user_id: i64,
    pub full_name: String,
    pub score: i64,
    pub attempts: i64,
    pub attempted_at: chrono::DateTime<chrono::Utc>,
}
