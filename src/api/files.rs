//! File operation endpoints. Every path goes through
//! [`FileSystemManager`](crate::services::FileSystemManager) security checks.

use axum::{
    Json,
    extract::State,
};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::validation::{validate_new_name, validate_path};
use super::{ApiError, ApiResponse, AppState, PathRequest};
use crate::library::recycle::CleanupStats;
use crate::models::media::FileMetadata;
use crate::services::filesystem::{
    BulkMoveOutcome, DeleteOutcome, FileOp, ListingEntry, MoveOutcome, OperationCheck,
    PathStatus, RenameOutcome,
};
use crate::services::media_service::MoveFileRequest;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    #[serde(alias = "path")]
    pub file_path: String,
    pub new_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    #[serde(alias = "path")]
    pub file_path: String,
    #[serde(default = "default_true")]
    pub use_trash: bool,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRequest {
    #[serde(alias = "path")]
    pub file_path: String,
    #[serde(default)]
    pub calculate_checksum: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkMoveRequest {
    pub source_paths: Vec<String>,
    #[serde(alias = "destinationPath")]
    pub destination_directory: String,
    #[serde(default)]
    pub merge_contents: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    pub path: String,
    pub operation: FileOp,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreRequest {
    pub recycled_path: String,
    pub original_path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashListing {
    pub path: String,
    pub items: Vec<String>,
    pub total_size: u64,
}

pub async fn rename_file(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RenameRequest>,
) -> Result<Json<ApiResponse<RenameOutcome>>, ApiError> {
    let path = validate_path(&request.file_path)?;
    let new_name = validate_new_name(&request.new_name)?;
    let outcome = state.fs().rename_file(Path::new(path), new_name).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// `POST /api/files/move`. With a `fileId` the stored media file record
/// follows the move.
pub async fn move_file(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MoveFileRequest>,
) -> Result<Json<ApiResponse<MoveOutcome>>, ApiError> {
    validate_path(&request.source_path)?;
    validate_path(&request.target_path)?;
    let outcome = state.media_service().move_media_file(request).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<ApiResponse<DeleteOutcome>>, ApiError> {
    let path = validate_path(&request.file_path)?;
    let outcome = state
        .fs()
        .delete_file(Path::new(path), request.use_trash)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn file_metadata(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MetadataRequest>,
) -> Result<Json<ApiResponse<FileMetadata>>, ApiError> {
    let path = validate_path(&request.file_path)?;
    let metadata = state
        .fs()
        .get_file_metadata(Path::new(path), request.calculate_checksum)
        .await?;
    Ok(Json(ApiResponse::success(metadata)))
}

pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PathRequest>,
) -> Result<Json<ApiResponse<FileMetadata>>, ApiError> {
    let path = validate_path(&request.path)?;
    let metadata = state.fs().create_directory(Path::new(path)).await?;
    Ok(Json(ApiResponse::success(metadata)))
}

pub async fn list_folder(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PathRequest>,
) -> Result<Json<ApiResponse<Vec<ListingEntry>>>, ApiError> {
    let path = validate_path(&request.path)?;
    let entries = state.fs().list_directory(Path::new(path)).await?;
    Ok(Json(ApiResponse::success(entries)))
}

pub async fn bulk_move(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BulkMoveRequest>,
) -> Result<Json<ApiResponse<BulkMoveOutcome>>, ApiError> {
    if request.source_paths.is_empty() {
        return Err(ApiError::validation("sourcePaths cannot be empty"));
    }
    let destination = validate_path(&request.destination_directory)?;
    let outcome = state
        .fs()
        .bulk_move(
            &request.source_paths,
            Path::new(destination),
            request.merge_contents,
        )
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn path_exists(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PathRequest>,
) -> Result<Json<ApiResponse<PathStatus>>, ApiError> {
    let path = validate_path(&request.path)?;
    let status = state.fs().path_status(Path::new(path)).await?;
    Ok(Json(ApiResponse::success(status)))
}

pub async fn validate_operation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<ApiResponse<OperationCheck>>, ApiError> {
    let path = validate_path(&request.path)?;
    let check = state
        .fs()
        .validate_operation(Path::new(path), request.operation)
        .await;
    Ok(Json(ApiResponse::success(check)))
}

// ============================================================================
// Trash
// ============================================================================

pub async fn list_trash(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<TrashListing>>, ApiError> {
    let bin = state.fs().recycle_bin();
    let items = bin
        .list()
        .await?
        .into_iter()
        .map(|p| p.display().to_string())
        .collect();
    let total_size = bin.get_size().await?;

    Ok(Json(ApiResponse::success(TrashListing {
        path: bin.path().display().to_string(),
        items,
        total_size,
    })))
}

pub async fn restore_from_trash(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RestoreRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let recycled = PathBuf::from(validate_path(&request.recycled_path)?);
    if recycled
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(ApiError::Forbidden {
            code: "INVALID_PATH",
            message: format!("Path traversal detected: {}", recycled.display()),
        });
    }
    let original = state
        .fs()
        .validate_path_security(Path::new(validate_path(&request.original_path)?))?;

    state
        .fs()
        .recycle_bin()
        .restore(&recycled, &original)
        .await
        .map_err(|e| ApiError::OperationFailed {
            code: "OPERATION_FAILED",
            message: format!("{e:#}"),
        })?;

    Ok(Json(ApiResponse::success(format!(
        "Restored {}",
        original.display()
    ))))
}

pub async fn empty_trash(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CleanupStats>>, ApiError> {
    let stats = state.fs().recycle_bin().empty().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// Purges trash entries past the retention window.
pub async fn cleanup_trash(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CleanupStats>>, ApiError> {
    let stats = state.fs().recycle_bin().cleanup().await?;
    Ok(Json(ApiResponse::success(stats)))
}
