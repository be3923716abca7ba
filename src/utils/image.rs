// src/utils/image.rs
//
// Cloudinary-style image host collaborator. Upload failures abort the
// enclosing mutation; deletes are called best-effort by the delete handlers.

use async_trait::async_trait;
use serde::Deserialize;

use crate::{config::CloudinaryConfig, error::AppError};

/// A hosted image reference.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub url: String,
    pub public_id: Option<String>,
}

/// External image-hosting collaborator.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload `source` (a fetchable URL) into `folder`, constrained to the
    /// given bounding box.
    async fn upload(
        &self,
        source: &str,
        folder: &str,
        width: u32,
        height: u32,
    ) -> Result<ImageData, AppError>;

    /// Delete a previously uploaded image by its public id.
    async fn delete(&self, public_id: &str) -> Result<(), AppError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

/// Cloudinary client.
///
/// Without credentials it degrades to pass-through: the source URL is kept
/// as-is and deletes are no-ops, so local development needs no account.
pub struct Cloudinary {
    client: reqwest::Client,
    config: Option<CloudinaryConfig>,
}

impl Cloudinary {
    pub fn new(config: Option<CloudinaryConfig>) -> Self {
        if config.is_none() {
            tracing::warn!("Cloudinary not configured; image uploads are pass-through");
        }
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl ImageHost for Cloudinary {
    async fn upload(
        &self,
        source: &str,
        folder: &str,
        width: u32,
        height: u32,
    ) -> Result<ImageData, AppError> {
        let Some(config) = &self.config else {
            return Ok(ImageData {
                url: source.to_string(),
                public_id: None,
            });
        };

        let endpoint = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            config.cloud_name
        );
        let transformation = format!("c_limit,w_{},h_{},q_auto", width, height);

        let response = self
            .client
            .post(&endpoint)
            .form(&[
                ("file", source),
                ("upload_preset", config.upload_preset.as_str()),
                ("folder", folder),
                ("transformation", transformation.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::UpstreamFailure(format!("Image upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamFailure(format!(
                "Image upload failed with status {}",
                response.status()
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamFailure(format!("Image upload failed: {}", e)))?;

        Ok(ImageData {
            url: uploaded.secure_url,
            public_id: Some(uploaded.public_id),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), AppError> {
        let Some(config) = &self.config else {
            return Ok(());
        };

        let endpoint = format!(
            "https://api.cloudinary.com/v1_1/{}/resources/image/upload",
            config.cloud_name
        );

        let response = self
            .client
            .delete(&endpoint)
            .basic_auth(&config.api_key, Some(&config.api_secret))
            .query(&[("public_ids[]", public_id)])
            .send()
            .await
            .map_err(|e| AppError::UpstreamFailure(format!("Image deletion failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamFailure(format!(
                "Image deletion failed with status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Best-effort delete used by delete handlers: a failed remote delete is
/// logged, never rolled back into the store deletion.
pub async fn delete_image_best_effort(images: &dyn ImageHost, public_id: Option<&str>) {
    if let Some(public_id) = public_id {
        if let Err(e) = images.delete(public_id).await {
            tracing::warn!(public_id, "failed to delete hosted image: {}", e);
        }
    }
}
