use crate::entities::{library_paths, media_directories, prelude::*, scan_results};
use crate::models::media::{LibraryPath, MediaFileInput};
use crate::models::scan::{ScanItem, ScanProgress};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};
use tracing::info;

use super::media_file::MediaFileRepository;
use super::{encode, encode_opt, now};

#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedScan {
    pub files_saved: usize,
    pub directories_saved: usize,
}

pub struct ScanRepository {
    conn: DatabaseConnection,
}

impl ScanRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_library_path(m: library_paths::Model) -> LibraryPath {
        LibraryPath {
            id: m.id,
            path: m.path,
            name: m.name,
            last_scanned: m.last_scanned,
            last_scan_id: m.last_scan_id,
            last_scan_status: m.last_scan_status,
            created_at: m.created_at,
        }
    }

    /// Writes the scan summary, every discovered item, and the library's last-scan data.
    pub async fn save(&self, progress: &ScanProgress) -> Result<SavedScan> {
        let summary = scan_results::ActiveModel {
            id: Set(progress.scan_id.clone()),
            library_path: Set(progress.library_path.clone()),
            status: Set(progress.status.as_str().to_string()),
            total_items: Set(to_i64(progress.total_items)),
            processed_items: Set(to_i64(progress.processed_items)),
            files_found: Set(to_i64(progress.files_found)),
            directories_found: Set(to_i64(progress.directories_found)),
            start_time: Set(progress.start_time.to_rfc3339()),
            end_time: Set(progress.end_time.map(|t| t.to_rfc3339())),
            elapsed_seconds: Set(progress.elapsed_seconds()),
            errors: Set(encode(&progress.errors)),
        };

        ScanResults::insert(summary)
            .on_conflict(
                OnConflict::column(scan_results::Column::Id)
                    .update_columns([
                        scan_results::Column::Status,
                        scan_results::Column::TotalItems,
                        scan_results::Column::ProcessedItems,
                        scan_results::Column::FilesFound,
                        scan_results::Column::DirectoriesFound,
                        scan_results::Column::EndTime,
                        scan_results::Column::ElapsedSeconds,
                        scan_results::Column::Errors,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        let mut files = Vec::new();
        let mut directories = Vec::new();
        let created_at = now();

        for item in &progress.scan_results {
            match item {
                ScanItem::File(f) => files.push(MediaFileInput {
                    user_id: None,
                    library_path: progress.library_path.clone(),
                    file_path: f.path.clone(),
                    file_name: f.name.clone(),
                    file_extension: f.extension.clone(),
                    file_size: i64::try_from(f.metadata.size).unwrap_or(i64::MAX),
                    media_type: Some(f.media_type.clone()),
                    scan_id: Some(progress.scan_id.clone()),
                    status: "discovered".to_string(),
                    metadata: f.media_metadata.clone(),
                    checksum: f.metadata.checksum.clone(),
                    parsed_info: Some(f.parsed_info.clone()),
                    file_metadata: serde_json::to_value(&f.metadata).ok(),
                    date_modified: f.metadata.modified.clone(),
                    date_created: f.metadata.created.clone(),
                }),
                ScanItem::Directory(d) => directories.push(media_directories::ActiveModel {
                    id: Set(uuid::Uuid::new_v4().to_string()),
                    library_path: Set(progress.library_path.clone()),
                    path: Set(d.path.clone()),
                    name: Set(d.name.clone()),
                    media_type: Set(d.media_type.clone()),
                    scan_id: Set(Some(progress.scan_id.clone())),
                    status: Set("discovered".to_string()),
                    metadata: Set(encode_opt(Some(&d.metadata))),
                    created_at: Set(created_at.clone()),
                }),
            }
        }

        let files_saved = MediaFileRepository::new(self.conn.clone())
            .add_many(&files)
            .await?;

        let directories_saved = directories.len();
        for chunk in directories.chunks(super::INSERT_CHUNK) {
            MediaDirectories::insert_many(chunk.to_vec())
                .exec_without_returning(&self.conn)
                .await?;
        }

        self.record_last_scan(progress).await?;

        info!(
            scan_id = %progress.scan_id,
            files_saved,
            directories_saved,
            "Scan results saved"
        );

        Ok(SavedScan {
            files_saved,
            directories_saved,
        })
    }

    async fn record_last_scan(&self, progress: &ScanProgress) -> Result<()> {
        let model = library_paths::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            path: Set(progress.library_path.clone()),
            name: Set(None),
            last_scanned: Set(Some(now())),
            last_scan_id: Set(Some(progress.scan_id.clone())),
            last_scan_status: Set(Some(progress.status.as_str().to_string())),
            created_at: Set(now()),
        };

        LibraryPaths::insert(model)
            .on_conflict(
                OnConflict::column(library_paths::Column::Path)
                    .update_columns([
                        library_paths::Column::LastScanned,
                        library_paths::Column::LastScanId,
                        library_paths::Column::LastScanStatus,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;
        Ok(())
    }

    pub async fn add_library_path(&self, path: &str, name: Option<&str>) -> Result<LibraryPath> {
        if let Some(existing) = LibraryPaths::find()
            .filter(library_paths::Column::Path.eq(path))
            .one(&self.conn)
            .await?
        {
            return Ok(Self::map_library_path(existing));
        }

        let model = library_paths::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            path: Set(path.to_string()),
            name: Set(name.map(String::from)),
            last_scanned: Set(None),
            last_scan_id: Set(None),
            last_scan_status: Set(None),
            created_at: Set(now()),
        };
        let inserted = model.insert(&self.conn).await?;
        Ok(Self::map_library_path(inserted))
    }

    pub async fn list_library_paths(&self) -> Result<Vec<LibraryPath>> {
        let rows = LibraryPaths::find()
            .order_by_asc(library_paths::Column::Path)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_library_path).collect())
    }

    pub async fn get_scan_record(&self, scan_id: &str) -> Result<Option<scan_results::Model>> {
        Ok(ScanResults::find_by_id(scan_id.to_string())
            .one(&self.conn)
            .await?)
    }
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
