// src/models/subject.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'subjects' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: i64,
    pub class_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub image_url: Option<String>,
    #[serde(skip)]
    pub public_id: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a subject.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubjectRequest {
    pub class_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub status: Option<String>,
    pub image_url: Option<String>,
}

/// DTO for updating a subject. Fields are optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubjectRequest {
    pub class_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub image_url: Option<String>,
}
