use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::services::image::{UploadOutcome, UploadedFile};

/// Upload one or more images.
///
/// # Endpoint
/// `POST /api/images/upload` (multipart)
///
/// Every part carrying a file name is stored; a text part named
/// `save_location` (or `saveLocation`) picks the target directory.
pub async fn upload_images(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadOutcome>>), ApiError> {
    let mut files = Vec::new();
    let mut save_location = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Failed to read {file_name}: {e}")))?;
            files.push(UploadedFile {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else if name == "save_location" || name == "saveLocation" {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::validation(format!("Invalid save_location: {e}")))?;
            save_location = Some(value);
        }
    }

    let outcome = state
        .images()
        .save_uploads(files, save_location.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(outcome))))
}
