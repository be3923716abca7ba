// src/handlers/category.rs

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
    models::category::{Category, CreateCategoryRequest, UpdateCategoryRequest},
    state::AppState,
    utils::image::delete_image_best_effort,
};

const IMAGE_FOLDER: &str = "QuizCategoriesImg";

/// Lists all categories.
pub async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, status, image_url, public_id, created_at
        FROM categories
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Categories fetched successfully",
        "totalCategories": categories.len(),
        "data": categories,
    })))
}

/// Retrieves a single category by ID.
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let category = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, status, image_url, public_id, created_at
        FROM categories
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Category not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": "Category fetched successfully",
        "data": category,
    })))
}

/// Creates a new category.
/// Admin only.
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let image = match &payload.image_url {
        Some(source) => Some(state.images.upload(source, IMAGE_FOLDER, 220, 200).await?),
        None => None,
    };

    let category = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (name, status, image_url, public_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, status, image_url, public_id, created_at
        "#,
    )
    .bind(&payload.name)
    .bind(payload.status.as_deref().unwrap_or("active"))
    .bind(image.as_ref().map(|i| i.url.clone()))
    .bind(image.as_ref().and_then(|i| i.public_id.clone()))
    .fetch_one(&state.pool)
    .await?;

    state.cache.invalidate_resource(Resource::Categories);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Category created successfully",
            "data": category,
        })),
    ))
}

/// Updates a category by ID.
/// Admin only.
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.name.is_none() && payload.status.is_none() && payload.image_url.is_none() {
        return Err(AppError::BadRequest("No updates provided".to_string()));
    }

    let image = match &payload.image_url {
        Some(source) => {
            let old: Option<(Option<String>,)> =
                sqlx::query_as("SELECT public_id FROM categories WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&state.pool)
                    .await?;
            let (old_public_id,) =
                old.ok_or(AppError::NotFound("Category not found".to_string()))?;
            delete_image_best_effort(state.images.as_ref(), old_public_id.as_deref()).await;
            Some(state.images.upload(source, IMAGE_FOLDER, 220, 200).await?)
        }
        None => None,
    };

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE categories SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
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
        tracing::error!("Failed to update category: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    state.cache.invalidate_resource(Resource::Categories);

    Ok(Json(json!({
        "success": true,
        "message": "Category updated successfully",
    })))
}

/// Deletes a category by ID.
/// Admin only.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted: Option<(Option<String>,)> =
        sqlx::query_as("DELETE FROM categories WHERE id = $1 RETURNING public_id")
            .bind(id)
            .fetch_optional(&state.pool)
            .await?;

    let (public_id,) = deleted.ok_or(AppError::NotFound("Category not found".to_string()))?;

    delete_image_best_effort(state.images.as_ref(), public_id.as_deref()).await;

    state.cache.invalidate_resource(Resource::Categories);

    Ok(Json(json!({
        "success": true,
        "message": "Category deleted successfully",
    })))
}
