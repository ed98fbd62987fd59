use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use super::validation::validate_path;
use super::{ApiError, ApiResponse, AppState};
use crate::models::media::MediaMetadata;
use crate::services::media_info::thumbnail_timestamp;
use crate::services::metadata::SupportedFormats;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    #[serde(alias = "path")]
    pub file_path: String,
    #[serde(default)]
    pub include_thumbnail: bool,
    pub thumbnail_timestamp: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    #[serde(flatten)]
    pub metadata: MediaMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub file_paths: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchQueued {
    pub task_id: String,
    pub total_files: usize,
}

pub async fn extract(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ApiResponse<ExtractResponse>>, ApiError> {
    let path = validate_path(&request.file_path)?;
    let path = state.fs().validate_path_security(Path::new(path))?;

    let extractor = state.extractor();
    let metadata = extractor.extract_video_metadata(&path).await?;

    let thumbnail_path = if request.include_thumbnail {
        let timestamp = request
            .thumbnail_timestamp
            .unwrap_or_else(|| thumbnail_timestamp(metadata.duration));
        let thumb = extractor.get_video_thumbnail(&path, timestamp).await?;
        Some(thumb.display().to_string())
    } else {
        None
    };

    Ok(Json(ApiResponse::success(ExtractResponse {
        metadata,
        thumbnail_path,
    })))
}

/// `POST /api/metadata/batch`
///
/// Extraction runs as a background task; poll `/api/tasks/{id}` for the
/// per-file results.
pub async fn batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BatchQueued>>), ApiError> {
    if request.file_paths.is_empty() {
        return Err(ApiError::validation("filePaths cannot be empty"));
    }

    let mut paths = Vec::with_capacity(request.file_paths.len());
    for raw in &request.file_paths {
        let path = state.fs().validate_path_security(Path::new(validate_path(raw)?))?;
        paths.push(path.display().to_string());
    }

    let total_files = paths.len();
    let extractor = state.extractor().clone();
    let task_id = state
        .tasks()
        .submit(
            "metadata_batch",
            serde_json::json!({ "totalFiles": total_files }),
            move |progress| async move {
                let extraction = extractor.batch_extract(paths).await;
                progress.set(100.0).await;
                let value = serde_json::to_value(extraction)?;
                anyhow::Ok(value)
            },
        )
        .await;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(BatchQueued {
            task_id,
            total_files,
        })),
    ))
}

pub async fn formats(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<SupportedFormats>> {
    Json(ApiResponse::success(state.extractor().supported_formats()))
}
