use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::ImageKitConfig;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Image host rejected the upload ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// An image accepted by the upload endpoint, ready to be sent to the host.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
    pub folder: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadedImage {
    pub url: String,
    #[serde(alias = "fileId")]
    pub file_id: String,
    pub name: String,
}

/// Third-party media storage.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<UploadedImage, UploadError>;
}

/// Client for the ImageKit upload API
pub struct ImageKitClient {
    client: Client,
    upload_url: String,
    private_key: String,
}

impl ImageKitClient {
    pub fn new(config: &ImageKitConfig) -> Result<Self, UploadError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            client,
            upload_url: config.upload_url.clone(),
            private_key: config.private_key.clone(),
        })
    }
}

#[async_trait]
impl ImageHost for ImageKitClient {
    async fn upload(&self, image: ImageUpload) -> Result<UploadedImage, UploadError> {
        let size = image.bytes.len();
        let file = Part::bytes(image.bytes)
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;

        let form = Form::new()
            .part("file", file)
            .text("fileName", image.file_name)
            .text("folder", image.folder)
            .text("useUniqueFileName", "true");

        tracing::info!("Uploading image to ImageKit ({} bytes)", size);

        // ImageKit expects the private key as the basic-auth user with an empty password
        let response = self
            .client
            .post(&self.upload_url)
            .basic_auth(&self.private_key, Some(""))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected { status, body });
        }

        let uploaded = response.json::<UploadedImage>().await?;
        tracing::info!(file_id = %uploaded.file_id, "Image uploaded");

        Ok(uploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_imagekit_response() {
        let body = r#"{
            "fileId": "6673f4b1",
            "name": "logo_x1Yz.png",
            "url": "https://ik.imagekit.io/demo/uploads/logo_x1Yz.png",
            "size": 1024,
            "fileType": "image"
        }"#;

        let uploaded: UploadedImage = serde_json::from_str(body).unwrap();
        assert_eq!(uploaded.file_id, "6673f4b1");
        assert_eq!(uploaded.name, "logo_x1Yz.png");
    }

    #[test]
    fn test_client_keeps_configured_endpoint() {
        let client = ImageKitClient::new(&ImageKitConfig {
            private_key: "private_abc".to_string(),
            upload_url: "http://localhost:9000/upload".to_string(),
        })
        .unwrap();

        assert_eq!(client.upload_url, "http://localhost:9000/upload");
    }
}
