// src/models/class.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'classes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// 'active' or 'inactive'.
    pub status: String,
    pub image_url: Option<String>,
    #[serde(skip)]
    pub public_id: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a class.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub status: Option<String>,
    /// Source URL for the class image; uploaded to the image host.
    pub image_url: Option<String>,
}

/// DTO for updating a class. Fields are optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClassRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub image_url: Option<String>,
}
