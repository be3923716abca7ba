// src/models/chapter.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'chapters' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: i64,
    pub subject_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub image_url: Option<String>,
    #[serde(skip)]
    pub public_id: Option<String>,
    /// Optional hosted study-material PDF.
    pub pdf_url: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Slim listing row for the paginated chapters endpoint.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChapterListItem {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
}

/// DTO for creating a chapter. An image source URL is required.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateChapterRequest {
    pub subject_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub status: Option<String>,
    #[validate(length(min = 1, message = "An image is required."))]
    pub image_url: String,
    pub pdf_url: Option<String>,
}

/// DTO for updating a chapter. Fields are optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChapterRequest {
    pub subject_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub image_url: Option<String>,
    pub pdf_url: Option<String>,
}
