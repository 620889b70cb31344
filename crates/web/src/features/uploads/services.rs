use chrono::{DateTime, Utc};

use super::client::{ImageHost, ImageUpload, UploadError, UploadedImage};
use crate::error::{WebError, WebResult};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const DEFAULT_FOLDER: &str = "/uploads";

/// The `file` part of an upload form
#[derive(Debug, Clone)]
pub struct FilePart {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Check an upload form and fill in the defaults for `fileName` and `folder`.
pub fn prepare_upload(
    file: Option<FilePart>,
    file_name: Option<String>,
    folder: Option<String>,
    now: DateTime<Utc>,
) -> WebResult<ImageUpload> {
    let file = file.ok_or_else(|| WebError::BadRequest("No file was selected".to_string()))?;

    let content_type = file
        .content_type
        .filter(|ct| ct.starts_with("image/"))
        .ok_or_else(|| WebError::BadRequest("Only image files are allowed".to_string()))?;

    if file.bytes.len() > MAX_IMAGE_BYTES {
        return Err(WebError::BadRequest(
            "File is too large. The maximum size is 5MB".to_string(),
        ));
    }

    let file_name = file_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("upload-{}", now.timestamp_millis()));

    let folder = folder
        .map(|folder| folder.trim().to_string())
        .filter(|folder| !folder.is_empty())
        .unwrap_or_else(|| DEFAULT_FOLDER.to_string());

    Ok(ImageUpload {
        bytes: file.bytes,
        content_type,
        file_name,
        folder,
    })
}

pub async fn upload_image(host: &dyn ImageHost, upload: ImageUpload) -> WebResult<UploadedImage> {
    host.upload(upload).await.map_err(|e| match e {
        UploadError::RequestError(e) => WebError::BadGateway(format!("Image upload failed: {}", e)),
        UploadError::Rejected { status, body } => {
            WebError::BadGateway(format!("Image host returned {}: {}", status, body))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;

    fn png(size: usize) -> Option<FilePart> {
        Some(FilePart {
            bytes: vec![0u8; size],
            content_type: Some("image/png".to_string()),
        })
    }

    #[test]
    fn test_defaults_for_name_and_folder() {
        let now = Utc.timestamp_millis_opt(1_735_689_600_000).unwrap();

        let upload = prepare_upload(png(16), None, Some("  ".to_string()), now).unwrap();
        assert_eq!(upload.file_name, "upload-1735689600000");
        assert_eq!(upload.folder, "/uploads");
        assert_eq!(upload.content_type, "image/png");

        let upload = prepare_upload(
            png(16),
            Some("logo.png".to_string()),
            Some("/contests".to_string()),
            now,
        )
        .unwrap();
        assert_eq!(upload.file_name, "logo.png");
        assert_eq!(upload.folder, "/contests");
    }

    #[test]
    fn test_rejects_missing_non_image_and_oversized_files() {
        let now = Utc::now();

        assert!(matches!(
            prepare_upload(None, None, None, now),
            Err(WebError::BadRequest(_))
        ));

        let pdf = Some(FilePart {
            bytes: vec![1, 2, 3],
            content_type: Some("application/pdf".to_string()),
        });
        assert!(matches!(
            prepare_upload(pdf, None, None, now),
            Err(WebError::BadRequest(_))
        ));

        let untyped = Some(FilePart {
            bytes: vec![1, 2, 3],
            content_type: None,
        });
        assert!(prepare_upload(untyped, None, None, now).is_err());

        assert!(prepare_upload(png(MAX_IMAGE_BYTES), None, None, now).is_ok());
        assert!(matches!(
            prepare_upload(png(MAX_IMAGE_BYTES + 1), None, None, now),
            Err(WebError::BadRequest(_))
        ));
    }

    struct RejectingHost;

    #[async_trait]
    impl ImageHost for RejectingHost {
        async fn upload(&self, _image: ImageUpload) -> Result<UploadedImage, UploadError> {
            Err(UploadError::Rejected {
                status: 403,
                body: "Your account cannot be authenticated".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_host_failure_is_bad_gateway() {
        let upload = prepare_upload(png(8), None, None, Utc::now()).unwrap();

        let result = upload_image(&RejectingHost, upload).await;
        assert!(matches!(result, Err(WebError::BadGateway(_))));
    }
}
