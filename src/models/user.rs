// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    pub full_name: String,

    /// Unique email address, used as the login identifier.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub mobile: Option<String>,

    /// User role: 'user' or 'admin'.
    pub role: String,

    /// Class the user is enrolled in. Null for admins.
    pub class_id: Option<i64>,

    /// Hosted profile image.
    pub profile_url: Option<String>,
    #[serde(skip)]
    pub public_id: Option<String>,

    // Password-reset state. Never serialized.
    #[serde(skip)]
    pub otp: Option<String>,
    #[serde(skip)]
    pub otp_expires: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip)]
    pub otp_verified: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Listing row for admin user/admins pages. Excludes sensitive and
/// internal fields entirely at the query level.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub profile_url: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Profile payload with the class name joined in.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub role: String,
    pub profile_url: Option<String>,
    pub class_name: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for user registration.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100, message = "Full name must be 2-100 characters."))]
    pub full_name: String,
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters."))]
    pub password: String,
    pub mobile: Option<String>,
    pub class_id: Option<i64>,
    /// Source URL for the profile image; uploaded to the image host.
    pub profile_url: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for Admin creating a user (can specify role).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdminCreateUserRequest {
    #[validate(length(min = 2, max = 100))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    pub mobile: Option<String>,
    /// 'user' or 'admin'.
    pub role: String,
    /// Required for non-admin users.
    pub class_id: Option<i64>,
    pub profile_url: Option<String>,
}

/// DTO for updating a user. Fields are optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub mobile: Option<String>,
    pub role: Option<String>,
    pub class_id: Option<i64>,
    pub profile_url: Option<String>,
}

/// DTO for self-service profile updates.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub class_id: Option<i64>,
    pub profile_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub old_password: String,
    #[validate(length(min = 6, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub new_password: String,
}
