// src/handlers/chapter.rs
//
// Chapter mutations affect subject and quiz views transitively, so they
// flush the whole response cache instead of enumerating keys.

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
        chapter::{Chapter, ChapterListItem, CreateChapterRequest, UpdateChapterRequest},
    },
    state::AppState,
    utils::image::delete_image_best_effort,
};

const IMAGE_FOLDER: &str = "QuizChaptersImg";

/// Lists chapters, paginated.
pub async fn list_chapters(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let chapters = sqlx::query_as::<_, ChapterListItem>(
        r#"
        SELECT id, name, image_url
        FROM chapters
        ORDER BY created_at DESC
        OFFSET $1 LIMIT $2
        "#,
    )
    .bind(params.offset())
    .bind(params.limit())
    .fetch_all(&state.pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chapters")
        .fetch_one(&state.pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Chapters fetched successfully",
        "totalChapters": total,
        "totalPages": params.total_pages(total),
        "currentPage": params.page(),
        "data": chapters,
    })))
}

/// Retrieves a single chapter by ID, with its subject name joined in.
pub async fn get_chapter(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let chapter = sqlx::query_as::<_, Chapter>(
        r#"
        SELECT id, subject_id, name, description, status, image_url, public_id, pdf_url, created_at
        FROM chapters
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Chapter not found".to_string()))?;

    let subject_name: Option<String> =
        sqlx::query_scalar("SELECT name FROM subjects WHERE id = $1")
            .bind(chapter.subject_id)
            .fetch_optional(&state.pool)
            .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Chapter fetched successfully",
        "data": chapter,
        "subjectName": subject_name,
    })))
}

/// Lists the chapters belonging to a subject.
pub async fn list_chapters_by_subject(
    State(state): State<AppState>,
    Path(subject_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let chapters = sqlx::query_as::<_, Chapter>(
        r#"
        SELECT id, subject_id, name, description, status, image_url, public_id, pdf_url, created_at
        FROM chapters
        WHERE subject_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(subject_id)
    .fetch_all(&state.pool)
    .await?;

    if chapters.is_empty() {
        return Err(AppError::NotFound(
            "No chapters found for this subject".to_string(),
        ));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Chapters retrieved successfully",
        "totalChapters": chapters.len(),
        "data": chapters,
    })))
}

/// Creates a new chapter.
/// Admin only.
pub async fn create_chapter(
    State(state): State<AppState>,
    Json(payload): Json<CreateChapterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let image = state
        .images
        .upload(&payload.image_url, IMAGE_FOLDER, 220, 200)
        .await?;

    let chapter = sqlx::query_as::<_, Chapter>(
        r#"
        INSERT INTO chapters (subject_id, name, description, status, image_url, public_id, pdf_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, subject_id, name, description, status, image_url, public_id, pdf_url, created_at
        "#,
    )
    .bind(payload.subject_id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.status.as_deref().unwrap_or("active"))
    .bind(&image.url)
    .bind(&image.public_id)
    .bind(&payload.pdf_url)
    .fetch_one(&state.pool)
    .await?;

    state.cache.invalidate_resource(Resource::Chapters);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Chapter created successfully",
            "data": chapter,
        })),
    ))
}

/// Updates a chapter by ID.
/// Admin only.
pub async fn update_chapter(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateChapterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.subject_id.is_none()
        && payload.name.is_none()
        && payload.description.is_none()
        && payload.status.is_none()
        && payload.image_url.is_none()
        && payload.pdf_url.is_none()
    {
        return Err(AppError::BadRequest("No updates provided".to_string()));
    }

    let image = match &payload.image_url {
        Some(source) => {
            let old: Option<(Option<String>,)> =
                sqlx::query_as("SELECT public_id FROM chapters WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&state.pool)
                    .await?;
            let (old_public_id,) =
                old.ok_or(AppError::NotFound("Chapter not found".to_string()))?;
            delete_image_best_effort(state.images.as_ref(), old_public_id.as_deref()).await;
            Some(state.images.upload(source, IMAGE_FOLDER, 220, 200).await?)
        }
        None => None,
    };

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE chapters SET ");
    let mut separated = builder.separated(", ");

    if let Some(subject_id) = payload.subject_id {
        separated.push("subject_id = ");
        separated.push_bind_unseparated(subject_id);
    }

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(description) = payload.description {
        separated.push("description = ");
        separated.push_bind_unseparated(description);
    }

    if let Some(status) = payload.status {
        separated.push("status = ");
        separated.push_bind_unseparated(status);
    }

    if let Some(pdf_url) = payload.pdf_url {
        separated.push("pdf_url = ");
        separated.push_bind_unseparated(pdf_url);
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
        tracing::error!("Failed to update chapter: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Chapter not found".to_string()));
    }

    state.cache.invalidate_resource(Resource::Chapters);

    Ok(Json(json!({
        "success": true,
        "message": "Chapter updated successfully",
    })))
}

/// Deletes a chapter by ID.
/// Admin only.
pub async fn delete_chapter(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted: Option<(Option<String>,)> =
        sqlx::query_as("DELETE FROM chapters WHERE id = $1 RETURNING public_id")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;

    let (public_id,) = deleted.ok_or(AppError::NotFound("Chapter not found".to_string()))?;

    delete_image_best_effort(state.images.as_ref(), public_id.as_deref()).await;

    state.cache.invalidate_resource(Resource::Chapters);

    Ok(Json(json!({
        "success": true,
        "message": "Chapter deleted successfully",
    })))
}
