// src/handlers/users.rs
//
// Admin-side user management. The self-service profile endpoints live in
// handlers::auth.

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
        user::{AdminCreateUserRequest, AdminUpdateUserRequest, UserListItem},
    },
    state::AppState,
    utils::{hash::hash_password, image::delete_image_best_effort},
};

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.to_string().contains("unique constraint") || e.to_string().contains("23505")
}

/// Lists regular users, paginated.
/// Admin only.
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, UserListItem>(
        r#"
        SELECT u.id, u.full_name, u.email, u.mobile, u.role, u.profile_url,
               c.name AS class_name, u.created_at
        FROM users u
        LEFT JOIN classes c ON u.class_id = c.id
        WHERE u.role = 'user'
        ORDER BY u.created_at DESC
        OFFSET $1 LIMIT $2
        "#,
    )
    .bind(params.offset())
    .bind(params.limit())
    .fetch_all(&state.pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'user'")
        .fetch_one(&state.pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Users fetched successfully",
        "totalUsers": total,
        "totalPages": params.total_pages(total),
        "currentPage": params.page(),
        "data": users,
    })))
}

/// Lists admin accounts, paginated.
/// Admin only.
pub async fn list_admins(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let admins = sqlx::query_as::<_, UserListItem>(
        r#"
        SELECT u.id, u.full_name, u.email, u.mobile, u.role, u.profile_url,
               c.name AS class_name, u.created_at
        FROM users u
        LEFT JOIN classes c ON u.class_id = c.id
        WHERE u.role = 'admin'
        ORDER BY u.created_at DESC
        OFFSET $1 LIMIT $2
        "#,
    )
    .bind(params.offset())
    .bind(params.limit())
    .fetch_all(&state.pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
        .fetch_one(&state.pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Admins fetched successfully",
        "totalAdmins": total,
        "totalPages": params.total_pages(total),
        "currentPage": params.page(),
        "data": admins,
    })))
}

/// Retrieves a single user by ID.
/// Admin only.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = sqlx::query_as::<_, UserListItem>(
        r#"
        SELECT u.id, u.full_name, u.email, u.mobile, u.role, u.profile_url,
               c.name AS class_name, u.created_at
        FROM users u
        LEFT JOIN classes c ON u.class_id = c.id
        WHERE u.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": "User fetched successfully",
        "data": user,
    })))
}

/// Creates a user or admin account with an explicit role.
/// Admin only.
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<AdminCreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let role = payload.role.as_str();
    if role != "user" && role != "admin" {
        return Err(AppError::BadRequest(
            "Role must be 'user' or 'admin'".to_string(),
        ));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (full_name, email, password, mobile, role, class_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(&payload.full_name)
    .bind(&payload.email)
    .bind(&hashed_password)
    .bind(&payload.mobile)
    .bind(role)
    .bind(payload.class_id)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Email '{}' is already registered", payload.email))
        } else {
            tracing::error!("Failed to create user: {:?}", e);
            AppError::from(e)
        }
    })?;

    if role == "admin" {
        state.cache.invalidate_resource(Resource::Admins);
    } else {
        state.cache.invalidate_resource(Resource::Users);
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User created successfully",
            "id": user_id,
        })),
    ))
}

/// Updates a user by ID.
/// Admin only.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.full_name.is_none()
        && payload.email.is_none()
        && payload.mobile.is_none()
        && payload.role.is_none()
        && payload.class_id.is_none()
        && payload.password.is_none()
    {
        return Err(AppError::BadRequest("No updates provided".to_string()));
    }

    if let Some(role) = payload.role.as_deref() {
        if role != "user" && role != "admin" {
            return Err(AppError::BadRequest(
                "Role must be 'user' or 'admin'".to_string(),
            ));
        }
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
    let mut separated = builder.separated(", ");

    if let Some(full_name) = payload.full_name {
        separated.push("full_name = ");
        separated.push_bind_unseparated(full_name);
    }

    if let Some(email) = payload.email {
        separated.push("email = ");
        separated.push_bind_unseparated(email);
    }

    if let Some(mobile) = payload.mobile {
        separated.push("mobile = ");
        separated.push_bind_unseparated(mobile);
    }

    if let Some(role) = payload.role {
        separated.push("role = ");
        separated.push_bind_unseparated(role);
    }

    if let Some(class_id) = payload.class_id {
        separated.push("class_id = ");
        separated.push_bind_unseparated(class_id);
    }

    if let Some(password) = payload.password {
        let hashed = hash_password(&password)?;
        separated.push("password = ");
        separated.push_bind_unseparated(hashed);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&state.pool).await.map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Email is already registered".to_string())
        } else {
            tracing::error!("Failed to update user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    state.cache.invalidate_resource(Resource::Users);
    state.cache.invalidate_resource(Resource::Admins);

    Ok(Json(json!({
        "success": true,
        "message": "User updated successfully",
    })))
}

/// Deletes a regular user by ID.
/// Admin only.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted: Option<(Option<String>,)> = sqlx::query_as(
        "DELETE FROM users WHERE id = $1 AND role = 'user' RETURNING public_id",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?;

    let (public_id,) = deleted.ok_or(AppError::NotFound("User not found".to_string()))?;

    delete_image_best_effort(state.images.as_ref(), public_id.as_deref()).await;

    state.cache.invalidate_resource(Resource::Users);

    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully",
    })))
}

/// Deletes an admin account by ID.
/// Admin only.
pub async fn delete_admin(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deleted: Option<(Option<String>,)> = sqlx::query_as(
        "DELETE FROM users WHERE id = $1 AND role = 'admin' RETURNING public_id",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?;

    let (public_id,) = deleted.ok_or(AppError::NotFound("Admin not found".to_string()))?;

    delete_image_best_effort(state.images.as_ref(), public_id.as_deref()).await;

    state.cache.invalidate_resource(Resource::Admins);

    Ok(Json(json!({
        "success": true,
        "message": "Admin deleted successfully",
    })))
}
