// src/handlers/class.rs

use axum::{
    Json,
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
    models::class::{Class, CreateClassRequest, UpdateClassRequest},
    state::AppState,
    utils::image::delete_image_best_effort,
};

const IMAGE_FOLDER: &str = "QuizClassesImg";

/// Lists all classes.
pub async fn list_classes(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let classes = sqlx::query_as::<_, Class>(
        r#"
        SELECT id, name, description, status, image_url, public_id, created_at
        FROM classes
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Classes fetched successfully",
        "totalClasses": classes.len(),
        "data": classes,
    })))
}

/// Retrieves a single class by ID.
pub async fn get_class(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let class = sqlx::query_as::<_, Class>(
        r#"
        SELECT id, name, description, status, image_url, public_id, created_at
        FROM classes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Class not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Class fetched successfully",
        "data": class,
    })))
}

/// Creates a new class.
/// Admin only.
pub async fn create_class(
    State(state): State<AppState>,
    Json(payload): Json<CreateClassRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // Upload before the store write: a failed upload aborts the mutation.
    let image = match &payload.image_url {
        Some(source) => Some(state.images.upload(source, IMAGE_FOLDER, 220, 200).await?),
        None => None,
    };

    let class = sqlx::query_as::<_, Class>(
        r#"
        INSERT INTO classes (name, description, status, image_url, public_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, name, description, status, image_url, public_id, created_at
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.status.as_deref().unwrap_or("active"))
    .bind(image.as_ref().map(|i| i.url.clone()))
    .bind(image.as_ref().and_then(|i| i.public_id.clone()))
    .fetch_one(&state.pool)
    .await?;

    state.cache.invalidate_resource(Resource::Classes);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Class created successfully",
            "data": class,
        })),
    ))
}

/// Updates a class by ID.
/// Admin only.
pub async fn update_class(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateClassRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.name.is_none()
        && payload.description.is_none()
        && payload.status.is_none()
        && payload.image_url.is_none()
    {
        return Err(AppError::BadRequest("No updates provided".to_string()));
    }

    // Replacing the image means deleting the old hosted copy first.
    let image = match &payload.image_url {
        Some(source) => {
            let old: Option<(Option<String>,)> =
                sqlx::query_as("SELECT public_id FROM classes WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&state.pool)
                    .await?;
            let (old_public_id,) = old.ok_or(AppError::NotFound("Class not found".to_string()))?;
            delete_image_best_effort(state.images.as_ref(), old_public_id.as_deref()).await;
            Some(state.images.upload(source, IMAGE_FOLDER, 220, 200).await?)
        }
        None => None,
    };

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE classes SET ");
    let mut separated = builder.separated(", ");

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

    if let Some(image) = image {
        separated.push("image_url = ");
        separated.push_bind_unseparated(image.url);
        separated.push("public_id = ");
        separated.push_bind_unseparated(image.public_id);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&state.pool).await.map_err(|e| {
        tracing::error!("Failed to update class: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Class not found".to_string()));
    }

    state.cache.invalidate_resource(Resource::Classes);

    Ok(Json(json!({
        "success": true,
        "message": "Class updated successfully",
    })))
}

/// Deletes a class by ID.
/// Admin only.
pub async fn delete_class(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted: Option<(Option<String>,)> =
        sqlx::query_as("DELETE FROM classes WHERE id = $1 RETURNING public_id")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;

    let (public_id,) = deleted.ok_or(AppError::NotFound("Class not found".to_string()))?;

    // Best-effort: a failed remote delete never rolls back the row delete.
    delete_image_best_effort(state.images.as_ref(), public_id.as_deref()).await;

    state.cache.invalidate_resource(Resource::Classes);

    Ok(Json(json!({
        "success": true,
        "message": "Class deleted successfully",
    })))
}
