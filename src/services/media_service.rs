//! Domain service for media file records, catalog assignments and
//! Jellyfin organization.

use crate::models::assignment::{HistoryEntry, MediaAssignment};
use crate::models::catalog::AssignmentSummary;
use crate::models::media::MediaFile;
use crate::services::error::LibraryError;
use crate::services::filesystem::MoveOutcome;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Library(#[from] LibraryError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for MediaError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for MediaError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanFilesRequest {
    pub file_paths: Vec<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub library_path: String,
    #[serde(default)]
    pub calculate_checksum: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFailure {
    pub file_path: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanFilesOutcome {
    pub processed_files: Vec<MediaFile>,
    pub errors: Vec<FileFailure>,
    pub total_processed: usize,
    pub total_errors: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignMovieRequest {
    pub file_ids: Vec<String>,
    pub movie_id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignEpisodeRequest {
    pub file_ids: Vec<String>,
    pub series_id: String,
    pub season_number: i32,
    pub episode_id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignOutcome {
    pub assignments: Vec<MediaAssignment>,
    pub skipped_file_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_summary: Option<AssignmentSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizeOutcome {
    pub assignment: MediaAssignment,
    pub source_path: String,
    pub target_path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveFileRequest {
    #[serde(default)]
    pub file_id: Option<String>,
    pub source_path: String,
    #[serde(alias = "destinationPath")]
    pub target_path: String,
    #[serde(default)]
    pub merge_contents: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentUpdate {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub organization_history: Option<Vec<HistoryEntry>>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JellyfinChecks {
    pub folder_exists: bool,
    pub naming_compliant: bool,
    pub files_present: bool,
    pub metadata_complete: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JellyfinValidation {
    pub folder_path: String,
    pub checks: JellyfinChecks,
    pub issues: Vec<String>,
    pub is_compliant: bool,
}

/// File records, their assignment to catalog entries, and moving them into
/// the library layout.
#[async_trait::async_trait]
pub trait MediaService: Send + Sync {
    /// Probes each path and stores a media file record for it. Per-file
    /// failures are collected instead of aborting the batch.
    async fn scan_files(&self, request: ScanFilesRequest) -> Result<ScanFilesOutcome, MediaError>;

    async fn get_file(&self, id: &str) -> Result<MediaFile, MediaError>;

    /// Creates one assignment per known file and refreshes the movie's
    /// assignment summary. Unknown file ids are skipped.
    async fn assign_to_movie(&self, request: AssignMovieRequest)
    -> Result<AssignOutcome, MediaError>;

    async fn assign_to_episode(
        &self,
        request: AssignEpisodeRequest,
    ) -> Result<AssignOutcome, MediaError>;

    /// Moves the assigned file to `target_folder`, or to its Jellyfin path
    /// when none is given. Never overwrites. A failed move leaves the source
    /// in place and marks the assignment `failed`.
    async fn organize(
        &self,
        assignment_id: &str,
        target_folder: Option<&str>,
    ) -> Result<OrganizeOutcome, MediaError>;

    async fn move_media_file(&self, request: MoveFileRequest) -> Result<MoveOutcome, MediaError>;

    async fn get_assignment(&self, id: &str) -> Result<MediaAssignment, MediaError>;

    /// A provided history replaces the stored one.
    async fn update_assignment(
        &self,
        id: &str,
        update: AssignmentUpdate,
    ) -> Result<MediaAssignment, MediaError>;

    async fn validate_jellyfin(&self, folder_path: &str)
    -> Result<JellyfinValidation, MediaError>;
}
