// src/handlers/auth.rs

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    cache::Resource,
    error::AppError,
    models::user::{
        ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, Profile, RegisterRequest,
        ResetPasswordRequest, UpdateProfileRequest, VerifyOtpRequest,
    },
    state::AppState,
    utils::{
        hash::{hash_password, verify_password},
        image::delete_image_best_effort,
        jwt::{Claims, sign_jwt},
        otp::generate_otp,
    },
};

const PROFILE_FOLDER: &str = "QuizProfilesImg";

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.to_string().contains("unique constraint") || e.to_string().contains("23505")
}

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it and signs a JWT so
/// the client is logged in immediately.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let image = match &payload.profile_url {
        Some(source) => Some(state.images.upload(source, PROFILE_FOLDER, 220, 200).await?),
        None => None,
    };

    let hashed_password = hash_password(&payload.password)?;

    let user_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (full_name, email, password, mobile, class_id, profile_url, public_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(&payload.full_name)
    .bind(&payload.email)
    .bind(&hashed_password)
    .bind(&payload.mobile)
    .bind(payload.class_id)
    .bind(image.as_ref().map(|i| i.url.clone()))
    .bind(image.as_ref().and_then(|i| i.public_id.clone()))
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Email '{}' is already registered", payload.email))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    let token = sign_jwt(
        user_id,
        "user",
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    state.cache.invalidate_resource(Resource::Users);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "id": user_id,
            "token": token,
        })),
    ))
}

/// Authenticates a user and returns a JWT token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let row: Option<(i64, String, String)> =
        sqlx::query_as("SELECT id, password, role FROM users WHERE email = $1")
            .bind(&payload.email)
            .fetch_optional(&state.pool)
            .await
            .map_err(|e| {
                tracing::error!("Login DB error: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

    let (user_id, password_hash, role) =
        row.ok_or(AppError::NotFound("User not found".to_string()))?;

    let is_valid = verify_password(&payload.password, &password_hash)?;

    if !is_valid {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(
        user_id,
        &role,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    let profile = fetch_profile(&state, user_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User logged in successfully",
        "user": profile,
        "token": token,
        "type": "Bearer",
    })))
}

/// Logs the user out.
///
/// Tokens are stateless; this is an acknowledgment for clients that want
/// an explicit logout round trip before discarding their token.
pub async fn logout(Extension(claims): Extension<Claims>) -> impl IntoResponse {
    tracing::debug!(user_id = claims.user_id(), "user logged out");
    Json(json!({
        "success": true,
        "message": "User logged out successfully",
    }))
}

async fn fetch_profile(state: &AppState, user_id: i64) -> Result<Profile, AppError> {
    sqlx::query_as::<_, Profile>(
        r#"
        SELECT u.id, u.full_name, u.email, u.mobile, u.role, u.profile_url,
               c.name AS class_name, u.created_at
        FROM users u
        LEFT JOIN classes c ON u.class_id = c.id
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))
}

/// Returns the current user's profile, class name joined in.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let profile = fetch_profile(&state, claims.user_id()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile fetched successfully",
        "data": profile,
    })))
}

/// Updates the current user's profile.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.full_name.is_none()
        && payload.email.is_none()
        && payload.mobile.is_none()
        && payload.class_id.is_none()
        && payload.profile_url.is_none()
    {
        return Err(AppError::BadRequest("No updates provided".to_string()));
    }

    let user_id = claims.user_id();

    let image = match &payload.profile_url {
        Some(source) => {
            let old: Option<(Option<String>,)> =
                sqlx::query_as("SELECT public_id FROM users WHERE id = $1")
                    .bind(user_id)
                    .fetch_optional(&state.pool)
                    .await?;
            let (old_public_id,) = old.ok_or(AppError::NotFound("User not found".to_string()))?;
            delete_image_best_effort(state.images.as_ref(), old_public_id.as_deref()).await;
            Some(state.images.upload(source, PROFILE_FOLDER, 220, 200).await?)
        }
        None => None,
    };

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

    if let Some(class_id) = payload.class_id {
        separated.push("class_id = ");
        separated.push_bind_unseparated(class_id);
    }

    if let Some(image) = image {
        separated.push("profile_url = ");
        separated.push_bind_unseparated(image.url);
        separated.push("public_id = ");
        separated.push_bind_unseparated(image.public_id);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(user_id);

    builder.build().execute(&state.pool).await.map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Email is already registered".to_string())
        } else {
            tracing::error!("Failed to update profile: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    state.cache.invalidate_resource(Resource::Users);

    let profile = fetch_profile(&state, user_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "data": profile,
    })))
}

/// Changes the current user's password after verifying the old one.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user_id = claims.user_id();

    let password_hash: Option<String> =
        sqlx::query_scalar("SELECT password FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&state.pool)
            .await?;

    let password_hash = password_hash.ok_or(AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&payload.old_password, &password_hash)? {
        return Err(AppError::BadRequest("Old password is incorrect".to_string()));
    }

    let new_hash = hash_password(&payload.new_password)?;

    sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
        .bind(&new_hash)
        .bind(user_id)
        .execute(&state.pool)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password updated successfully",
    })))
}

/// Starts the password-reset flow: generates an OTP valid for ten minutes
/// and stores it on the user. Delivery is handled outside this service.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let otp = generate_otp();
    let expires = chrono::Utc::now() + chrono::Duration::minutes(10);

    let result = sqlx::query(
        r#"
        UPDATE users
        SET otp = $1, otp_expires = $2, otp_verified = FALSE
        WHERE email = $3
        "#,
    )
    .bind(&otp)
    .bind(expires)
    .bind(&payload.email)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(json!({
        "success": true,
        "message": "OTP sent to your email",
    })))
}

/// Verifies a password-reset OTP.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let result = sqlx::query(
        r#"
        UPDATE users
        SET otp_verified = TRUE
        WHERE email = $1 AND otp = $2 AND otp_expires > now()
        "#,
    )
    .bind(&payload.email)
    .bind(&payload.otp)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::BadRequest("Invalid or expired OTP".to_string()));
    }

    Ok(Json(json!({
        "success": true,
        "message": "OTP verified successfully",
    })))
}

/// Completes the password-reset flow. Requires a previously verified OTP;
/// clears all OTP state on success.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let verified: Option<bool> =
        sqlx::query_scalar("SELECT otp_verified FROM users WHERE email = $1")
            .bind(&payload.email)
            .fetch_optional(&state.pool)
            .await?;

    let verified = verified.ok_or(AppError::NotFound("User not found".to_string()))?;

    if !verified {
        return Err(AppError::BadRequest(
            "OTP verification is required".to_string(),
        ));
    }

    let new_hash = hash_password(&payload.new_password)?;

    sqlx::query(
        r#"
        UPDATE users
        SET password = $1, otp = NULL, otp_expires = NULL, otp_verified = FALSE
        WHERE email = $2
        "#,
    )
    .bind(&new_hash)
    .bind(&payload.email)
    .execute(&state.pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password has been reset successfully",
    })))
}
