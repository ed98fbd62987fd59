//! Library scan endpoints and read access to persisted scan output.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::validation::{validate_max_age_hours, validate_path};
use super::{ApiError, ApiResponse, AppState, MessageDto};
use crate::constants::limits::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::db::ScannedItemFilter;
use crate::models::media::{LibraryPath, MediaDirectory, MediaFile};
use crate::models::scan::{ScanSnapshot, ScanStatus};
use crate::services::filesystem::Verification;
use crate::services::scanner::{ScanOptions, ScanResults};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartScanRequest {
    pub library_path: String,
    #[serde(flatten)]
    pub options: ScanOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStarted {
    pub scan_id: String,
    pub status: ScanStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopScanRequest {
    pub scan_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ScanListQuery {
    pub status: Option<ScanStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
}

const fn default_max_age_hours() -> u64 {
    24
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResult {
    pub removed_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub file_paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedItemQuery {
    pub scan_id: Option<String>,
    pub library_path: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ScannedItemQuery {
    fn into_filter(self) -> ScannedItemFilter {
        ScannedItemFilter {
            scan_id: self.scan_id,
            library_path: self.library_path,
            limit: self
                .limit
                .filter(|l| *l > 0)
                .map_or(DEFAULT_PAGE_SIZE, |l| l.min(MAX_PAGE_SIZE)),
            offset: self.offset.unwrap_or(0),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddLibraryPathRequest {
    pub path: String,
    pub name: Option<String>,
}

/// `POST /api/library/scan`
///
/// Returns immediately with the scan id; progress is polled through
/// `GET /api/library/scan/status/{id}`.
pub async fn start_scan(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartScanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ScanStarted>>), ApiError> {
    let library_path = validate_path(&request.library_path)?;
    let scan_id = state
        .scanner()
        .start_scan(library_path, request.options)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(ScanStarted {
            scan_id,
            status: ScanStatus::Scanning,
        })),
    ))
}

pub async fn scan_status(
    State(state): State<Arc<AppState>>,
    Path(scan_id): Path<String>,
) -> Result<Json<ApiResponse<ScanSnapshot>>, ApiError> {
    let snapshot = state
        .scanner()
        .get_scan_status(&scan_id)
        .await
        .ok_or_else(|| ApiError::not_found("Scan", &scan_id))?;
    Ok(Json(ApiResponse::success(snapshot)))
}

pub async fn scan_results(
    State(state): State<Arc<AppState>>,
    Path(scan_id): Path<String>,
) -> Result<Json<ApiResponse<ScanResults>>, ApiError> {
    let results = state.scanner().get_scan_results(&scan_id).await?;
    Ok(Json(ApiResponse::success(results)))
}

pub async fn stop_scan(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StopScanRequest>,
) -> Result<Json<ApiResponse<MessageDto>>, ApiError> {
    if state.scanner().get_scan_status(&request.scan_id).await.is_none() {
        return Err(ApiError::not_found("Scan", &request.scan_id));
    }
    if !state.scanner().stop_scan(&request.scan_id).await {
        return Err(ApiError::validation(format!(
            "Scan {} is not running",
            request.scan_id
        )));
    }
    Ok(Json(ApiResponse::success(MessageDto::new(
        "Scan cancelled",
    ))))
}

pub async fn list_scans(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScanListQuery>,
) -> Result<Json<ApiResponse<Vec<ScanSnapshot>>>, ApiError> {
    let scans = state.scanner().list_scans(query.status).await;
    Ok(Json(ApiResponse::success(scans)))
}

pub async fn cleanup_scan(
    State(state): State<Arc<AppState>>,
    Path(scan_id): Path<String>,
) -> Result<Json<ApiResponse<MessageDto>>, ApiError> {
    state.scanner().cleanup_scan(&scan_id).await?;
    Ok(Json(ApiResponse::success(MessageDto::new(format!(
        "Scan {scan_id} cleaned up"
    )))))
}

pub async fn cleanup_scans(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CleanupQuery>,
) -> Result<Json<ApiResponse<CleanupResult>>, ApiError> {
    let max_age_hours = validate_max_age_hours(query.max_age_hours)?;
    let removed_count = state.scanner().cleanup_completed_scans(max_age_hours).await;
    Ok(Json(ApiResponse::success(CleanupResult { removed_count })))
}

pub async fn verify_files(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<ApiResponse<Verification>>, ApiError> {
    if request.file_paths.is_empty() {
        return Err(ApiError::validation("filePaths cannot be empty"));
    }
    let verification = state.fs().verify_files(&request.file_paths).await;
    Ok(Json(ApiResponse::success(verification)))
}

pub async fn scanned_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScannedItemQuery>,
) -> Result<Json<ApiResponse<Vec<MediaFile>>>, ApiError> {
    let files = state.store().list_media_files(&query.into_filter()).await?;
    Ok(Json(ApiResponse::success(files)))
}

pub async fn scanned_directories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScannedItemQuery>,
) -> Result<Json<ApiResponse<Vec<MediaDirectory>>>, ApiError> {
    let directories = state
        .store()
        .list_media_directories(&query.into_filter())
        .await?;
    Ok(Json(ApiResponse::success(directories)))
}

pub async fn list_library_paths(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<LibraryPath>>>, ApiError> {
    let paths = state.store().list_library_paths().await?;
    Ok(Json(ApiResponse::success(paths)))
}

pub async fn add_library_path(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddLibraryPathRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LibraryPath>>), ApiError> {
    let path = validate_path(&request.path)?;
    let canonical = state
        .fs()
        .validate_path_security(std::path::Path::new(path))?;

    let stored = state
        .store()
        .add_library_path(&canonical.display().to_string(), request.name.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(stored))))
}
