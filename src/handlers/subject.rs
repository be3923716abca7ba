// src/handlers/subject.rs

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
    models::subject::{CreateSubjectRequest, Subject, UpdateSubjectRequest},
    state::AppState,
    utils::image::delete_image_best_effort,
};

const IMAGE_FOLDER: &str = "QuizSubjectsImg";

/// Lists all subjects.
pub async fn list_subjects(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let subjects = sqlx::query_as::<_, Subject>(
        r#"
        SELECT id, class_id, name, description, status, image_url, public_id, created_at
        FROM subjects
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Subjects fetched successfully",
        "totalSubjects": subjects.len(),
        "data": subjects,
    })))
}

/// Lists the subjects belonging to a class.
pub async fn list_subjects_by_class(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let subjects = sqlx::query_as::<_, Subject>(
        r#"
        SELECT id, class_id, name, description, status, image_url, public_id, created_at
        FROM subjects
        WHERE class_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(class_id)
    .fetch_all(&state.pool)
    .await?;

    if subjects.is_empty() {
        return Err(AppError::NotFound(
            "No subjects found for this class".to_string(),
        ));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Subjects retrieved successfully",
        "totalSubjects": subjects.len(),
        "data": subjects,
    })))
}

/// Retrieves a single subject by ID.
pub async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let subject = sqlx::query_as::<_, Subject>(
        r#"
        SELECT id, class_id, name, description, status, image_url, public_id, created_at
        FROM subjects
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Subject not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Subject fetched successfully",
        "data": subject,
    })))
}

/// Creates a new subject.
/// Admin only.
pub async fn create_subject(
    State(state): State<AppState>,
    Json(payload): Json<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let image = match &payload.image_url {
        Some(source) => Some(state.images.upload(source, IMAGE_FOLDER, 220, 200).await?),
        None => None,
    };

    let subject = sqlx::query_as::<_, Subject>(
        r#"
        INSERT INTO subjects (class_id, name, description, status, image_url, public_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, class_id, name, description, status, image_url, public_id, created_at
        "#,
    )
    .bind(payload.class_id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.status.as_deref().unwrap_or("active"))
    .bind(image.as_ref().map(|i| i.url.clone()))
    .bind(image.as_ref().and_then(|i| i.public_id.clone()))
    .fetch_one(&state.pool)
    .await?;

    state.cache.invalidate_resource(Resource::Subjects);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Subject created successfully",
            "data": subject,
        })),
    ))
}

/// Updates a subject by ID.
/// Admin only.
pub async fn update_subject(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.class_id.is_none()
        && payload.name.is_none()
        && payload.description.is_none()
        && payload.status.is_none()
        && payload.image_url.is_none()
    {
        return Err(AppError::BadRequest("No updates provided".to_string()));
    }

    let image = match &payload.image_url {
        Some(source) => {
            let old: Option<(Option<String>,)> =
                sqlx::query_as("SELECT public_id FROM subjects WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&state.pool)
                    .await?;
            let (old_public_id,) =
                old.ok_or(AppError::NotFound("Subject not found".to_string()))?;
            delete_image_best_effort(state.images.as_ref(), old_public_id.as_deref()).await;
            Some(state.images.upload(source, IMAGE_FOLDER, 220, 200).await?)
        }
        None => None,
    };

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE subjects SET ");
    let mut separated = builder.separated(", ");

    if let Some(class_id) = payload.class_id {
        separated.push("class_id = ");
        separated.push_bind_unseparated(class_id);
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

    if let Some(image) = image {
        separated.push("image_url = ");
        separated.push_bind_unseparated(image.url);
        separated.push("public_id = ");
        separated.push_bind_unseparated(image.public_id);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&state.pool).await.map_err(|e| {
        tracing::error!("Failed to update subject: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }

    state.cache.invalidate_resource(Resource::Subjects);

    Ok(Json(json!({
        "success": true,
        "message": "Subject updated successfully",
    })))
}

/// Deletes a subject by ID.
/// Admin only.
pub async fn delete_subject(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted: Option<(Option<String>,)> =
        sqlx::query_as("DELETE FROM subjects WHERE id = $1 RETURNING public_id")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;

    let (public_id,) = deleted.ok_or(AppError::NotFound("Subject not found".to_string()))?;

    delete_image_best_effort(state.images.as_ref(), public_id.as_deref()).await;

    state.cache.invalidate_resource(Resource::Subjects);

    Ok(Json(json!({
        "success": true,
        "message": "Subject deleted successfully",
    })))
}
