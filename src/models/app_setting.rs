// src/models/app_setting.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::AppError;

/// One settings document per kind, upserted as a singleton.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettingRow {
    pub kind: String,
    pub data: sqlx::types::Json<serde_json::Value>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// The settings variants the app exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKind {
    General,
    App,
    PrivacyPolicy,
    Terms,
    Notification,
    AppUpdate,
}

impl SettingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKind::General => "general",
            SettingKind::App => "app",
            SettingKind::PrivacyPolicy => "privacy-policy",
            SettingKind::Terms => "terms",
            SettingKind::Notification => "notification",
            SettingKind::AppUpdate => "app-update",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "general" => Ok(SettingKind::General),
            "app" => Ok(SettingKind::App),
            "privacy-policy" => Ok(SettingKind::PrivacyPolicy),
            "terms" => Ok(SettingKind::Terms),
            "notification" => Ok(SettingKind::Notification),
            "app-update" => Ok(SettingKind::AppUpdate),
            other => Err(AppError::BadRequest(format!(
                "Unknown settings kind '{}'",
                other
            ))),
        }
    }

    /// Validates a raw payload against this kind's typed shape and returns
    /// it normalized for storage.
    pub fn validate_payload(
        &self,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, AppError> {
        match self {
            SettingKind::General => {
                let typed: GeneralSettings = serde_json::from_value(payload)?;
                Ok(serde_json::to_value(typed)?)
            }
            SettingKind::App => {
                let typed: AppSettings = serde_json::from_value(payload)?;
                Ok(serde_json::to_value(typed)?)
            }
            SettingKind::PrivacyPolicy => {
                let typed: PrivacyPolicy = serde_json::from_value(payload)?;
                Ok(serde_json::to_value(typed)?)
            }
            SettingKind::Terms => {
                let typed: TermsAndConditions = serde_json::from_value(payload)?;
                Ok(serde_json::to_value(typed)?)
            }
            SettingKind::Notification => {
                let typed: NotificationSettings = serde_json::from_value(payload)?;
                Ok(serde_json::to_value(typed)?)
            }
            SettingKind::AppUpdate => {
                let typed: AppUpdate = serde_json::from_value(payload)?;
                Ok(serde_json::to_value(typed)?)
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    pub email: Option<String>,
    pub author: Option<String>,
    pub contact: Option<String>,
    pub website: Option<String>,
    pub developed_by: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub rtl: bool,
    pub app_maintenance: bool,
    pub google_login: bool,
    pub first_open_login: bool,
    pub screenshot_block: bool,
    pub vpn_block: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrivacyPolicy {
    pub policy: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TermsAndConditions {
    pub terms: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub one_signal_app_id: String,
    pub one_signal_app_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUpdate {
    pub is_update_enabled: bool,
    pub new_app_version: String,
    pub description: Option<String>,
    pub app_link: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_roundtrips_through_its_string_form() {
        for kind in [
            SettingKind::General,
            SettingKind::App,
            SettingKind::PrivacyPolicy,
            SettingKind::Terms,
            SettingKind::Notification,
            SettingKind::AppUpdate,
        ] {
            assert_eq!(SettingKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(SettingKind::parse("bogus").is_err());
    }

    #[test]
    fn payloads_are_validated_per_kind() {
        let ok = SettingKind::Terms.validate_payload(json!({"terms": "be nice"}));
        assert!(ok.is_ok());

        let missing_field = SettingKind::AppUpdate.validate_payload(json!({"description": "x"}));
        assert!(missing_field.is_err());
    }
}
