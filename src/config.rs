// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Credentials for the Cloudinary-style image host.
/// Optional: without them the image client degrades to pass-through.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub upload_preset: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    /// Maximum number of cached responses held at once.
    pub cache_capacity: usize,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub cloudinary: Option<CloudinaryConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7 * 24 * 60 * 60);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8000);

        let cache_capacity = env::var("CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1024);

        let admin_email = env::var("ADMIN_EMAIL").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        let cloudinary = match (
            env::var("CLOUDINARY_CLOUD_NAME"),
            env::var("CLOUDINARY_API_KEY"),
            env::var("CLOUDINARY_API_SECRET"),
            env::var("CLOUDINARY_UPLOAD_PRESET"),
        ) {
            (Ok(cloud_name), Ok(api_key), Ok(api_secret), Ok(upload_preset)) => {
                Some(CloudinaryConfig {
                    cloud_name,
                    api_key,
                    api_secret,
                    upload_preset,
                })
            }
            _ => None,
        };

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            cache_capacity,
            admin_email,
            admin_password,
            cloudinary,
        }
    }
}
