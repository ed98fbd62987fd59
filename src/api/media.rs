//! Media file records, catalog assignments and library organization.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::validate_path;
use super::{ApiError, ApiResponse, AppState, PathRequest};
use crate::models::assignment::MediaAssignment;
use crate::models::media::MediaFile;
use crate::services::media_service::{
    AssignEpisodeRequest, AssignMovieRequest, AssignOutcome, AssignmentUpdate,
    JellyfinValidation, OrganizeOutcome, ScanFilesOutcome, ScanFilesRequest,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizeRequest {
    pub target_folder: Option<String>,
}

fn require_file_ids(file_ids: &[String]) -> Result<(), ApiError> {
    if file_ids.is_empty() {
        return Err(ApiError::validation("fileIds cannot be empty"));
    }
    Ok(())
}

pub async fn scan_files(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScanFilesRequest>,
) -> Result<Json<ApiResponse<ScanFilesOutcome>>, ApiError> {
    if request.file_paths.is_empty() {
        return Err(ApiError::validation("filePaths cannot be empty"));
    }
    validate_path(&request.library_path)?;
    let outcome = state.media_service().scan_files(request).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MediaFile>>, ApiError> {
    let file = state.media_service().get_file(&id).await?;
    Ok(Json(ApiResponse::success(file)))
}

pub async fn assign_movie(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AssignMovieRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AssignOutcome>>), ApiError> {
    require_file_ids(&request.file_ids)?;
    let outcome = state.media_service().assign_to_movie(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(outcome))))
}

pub async fn assign_episode(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AssignEpisodeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AssignOutcome>>), ApiError> {
    require_file_ids(&request.file_ids)?;
    if request.season_number < 0 {
        return Err(ApiError::validation("seasonNumber cannot be negative"));
    }
    let outcome = state.media_service().assign_to_episode(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(outcome))))
}

/// `POST /api/media/organize/{assignmentId}`
///
/// The body is optional. Without a `targetFolder` the file goes to its
/// Jellyfin location under `library.jellyfin_root`.
pub async fn organize(
    State(state): State<Arc<AppState>>,
    Path(assignment_id): Path<String>,
    body: Option<Json<OrganizeRequest>>,
) -> Result<Json<ApiResponse<OrganizeOutcome>>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    if let Some(folder) = &request.target_folder {
        validate_path(folder)?;
    }

    let outcome = state
        .media_service()
        .organize(&assignment_id, request.target_folder.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

pub async fn validate_jellyfin(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PathRequest>,
) -> Result<Json<ApiResponse<JellyfinValidation>>, ApiError> {
    let folder = validate_path(&request.path)?;
    let validation = state.media_service().validate_jellyfin(folder).await?;
    Ok(Json(ApiResponse::success(validation)))
}

pub async fn get_assignment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MediaAssignment>>, ApiError> {
    let assignment = state.media_service().get_assignment(&id).await?;
    Ok(Json(ApiResponse::success(assignment)))
}

pub async fn update_assignment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(update): Json<AssignmentUpdate>,
) -> Result<Json<ApiResponse<MediaAssignment>>, ApiError> {
    if update.status.is_none() && update.organization_history.is_none() {
        return Err(ApiError::validation(
            "Provide status or organizationHistory",
        ));
    }
    let assignment = state.media_service().update_assignment(&id, update).await?;
    Ok(Json(ApiResponse::success(assignment)))
}
