// src/handlers/settings.rs
//
// App settings are singletons keyed by kind; updates upsert the one row
// for that kind. Payloads are validated against the kind's schema before
// they touch the database.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    cache::Resource,
    error::AppError,
    models::app_setting::{AppSettingRow, SettingKind},
    state::AppState,
};

/// Returns the settings document for one kind.
pub async fn get_settings(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let kind = SettingKind::parse(&kind)?;

    let row = sqlx::query_as::<_, AppSettingRow>(
        "SELECT kind, data, updated_at FROM app_settings WHERE kind = $1",
    )
    .bind(kind.as_str())
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound(format!(
        "No '{}' settings configured",
        kind.as_str()
    )))?;

    Ok(Json(json!({
        "success": true,
        "message": "Settings fetched successfully",
        "data": row.data,
        "updatedAt": row.updated_at,
    })))
}

/// Creates or replaces the settings document for one kind.
/// Admin only.
pub async fn put_settings(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    let kind = SettingKind::parse(&kind)?;
    let payload = kind.validate_payload(payload)?;

    let row = sqlx::query_as::<_, AppSettingRow>(
        r#"
        INSERT INTO app_settings (kind, data, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (kind) DO UPDATE SET data = EXCLUDED.data, updated_at = now()
        RETURNING kind, data, updated_at
        "#,
    )
    .bind(kind.as_str())
    .bind(&payload)
    .fetch_one(&state.pool)
    .await?;

    state.cache.invalidate_resource(Resource::Settings);

    Ok(Json(json!({
        "success": true,
        "message": "Settings saved successfully",
        "data": row.data,
        "updatedAt": row.updated_at,
    })))
}
