use axum::{
    Json,
    extract::{Multipart, State},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::WebError;
use crate::state::AppState;

use super::client::UploadedImage;
use super::services::{self, FilePart};

/// Multipart form accepted by the upload endpoint
#[allow(dead_code)]
#[derive(Deserialize, ToSchema)]
pub struct ImageUploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    /// Defaults to `upload-<unix millis>`
    #[serde(rename = "fileName")]
    file_name: Option<String>,
    /// Defaults to `/uploads`
    folder: Option<String>,
}

fn multipart_error(error: impl std::fmt::Display) -> WebError {
    WebError::BadRequest(format!("Invalid multipart body: {}", error))
}

#[utoipa::path(
    post,
    path = "/api/uploads/image",
    request_body(content = ImageUploadForm, content_type = "multipart/form-data"),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Image stored by the media host", body = UploadedImage),
        (status = 400, description = "Missing file, not an image, or larger than 5MB"),
        (status = 401, description = "Authentication required"),
        (status = 502, description = "The media host failed"),
        (status = 503, description = "Uploads are not configured")
    ),
    tag = "uploads"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, WebError> {
    let Some(host) = state.images.clone() else {
        return Err(WebError::ServiceUnavailable(
            "Image uploads are not configured".to_string(),
        ));
    };

    let mut file = None;
    let mut file_name = None;
    let mut folder = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some(FilePart {
                    bytes: bytes.to_vec(),
                    content_type,
                });
            }
            Some("fileName") => file_name = Some(field.text().await.map_err(multipart_error)?),
            Some("folder") => folder = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let upload = services::prepare_upload(file, file_name, folder, Utc::now())?;
    let uploaded = services::upload_image(host.as_ref(), upload).await?;

    Ok(Json(uploaded).into_response())
}
