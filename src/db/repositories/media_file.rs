use crate::entities::{media_directories, media_files, prelude::*};
use crate::models::media::{MediaDirectory, MediaFile, MediaFileInput};
use crate::models::scan::ExistingItem;
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use super::{decode_list, decode_opt, encode, encode_opt, now};

/// Filters shared by the file and directory listings.
#[derive(Debug, Clone, Default)]
pub struct ScannedItemFilter {
    pub scan_id: Option<String>,
    pub library_path: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

pub struct MediaFileRepository {
    conn: DatabaseConnection,
}

impl MediaFileRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_file(m: media_files::Model) -> MediaFile {
        MediaFile {
            id: m.id,
            user_id: m.user_id,
            library_path: m.library_path,
            file_path: m.file_path,
            file_name: m.file_name,
            file_extension: m.file_extension,
            file_size: m.file_size,
            media_type: m.media_type,
            scan_id: m.scan_id,
            status: m.status,
            container_format: m.container_format,
            duration: m.duration,
            overall_bitrate: m.overall_bitrate,
            video: decode_opt(m.video_metadata.as_deref()),
            audio_tracks: decode_list(&m.audio_tracks),
            subtitle_tracks: decode_list(&m.subtitle_tracks),
            checksum: m.checksum,
            is_assigned: m.is_assigned,
            assignment_id: m.assignment_id,
            media_id: m.media_id,
            parsed_info: decode_opt(m.parsed_info.as_deref()),
            file_metadata: decode_opt(m.file_metadata.as_deref()),
            date_added: m.date_added,
            date_modified: m.date_modified,
            date_created: m.date_created,
        }
    }

    fn map_directory(m: media_directories::Model) -> MediaDirectory {
        MediaDirectory {
            id: m.id,
            library_path: m.library_path,
            path: m.path,
            name: m.name,
            media_type: m.media_type,
            scan_id: m.scan_id,
            status: m.status,
            metadata: decode_opt(m.metadata.as_deref()),
            created_at: m.created_at,
        }
    }

    fn file_active_model(input: &MediaFileInput) -> media_files::ActiveModel {
        let metadata = input.metadata.as_ref();
        media_files::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            user_id: Set(input.user_id.clone()),
            library_path: Set(input.library_path.clone()),
            file_path: Set(input.file_path.clone()),
            file_name: Set(input.file_name.clone()),
            file_extension: Set(input.file_extension.clone()),
            file_size: Set(input.file_size),
            media_type: Set(input.media_type.clone()),
            scan_id: Set(input.scan_id.clone()),
            status: Set(input.status.clone()),
            container_format: Set(metadata.and_then(|m| m.format.format_name.clone())),
            duration: Set(metadata.and_then(|m| m.duration)),
            overall_bitrate: Set(metadata.and_then(|m| m.bitrate)),
            video_metadata: Set(encode_opt(metadata.and_then(|m| m.video.as_ref()))),
            audio_tracks: Set(metadata.map_or_else(|| "[]".to_string(), |m| encode(&m.audio))),
            subtitle_tracks: Set(
                metadata.map_or_else(|| "[]".to_string(), |m| encode(&m.subtitle)),
            ),
            checksum: Set(input.checksum.clone()),
            is_assigned: Set(false),
            assignment_id: Set(None),
            media_id: Set(None),
            parsed_info: Set(encode_opt(input.parsed_info.as_ref())),
            file_metadata: Set(encode_opt(input.file_metadata.as_ref())),
            date_added: Set(now()),
            date_modified: Set(input.date_modified.clone()),
            date_created: Set(input.date_created.clone()),
        }
    }

    pub async fn add(&self, input: &MediaFileInput) -> Result<MediaFile> {
        let inserted = Self::file_active_model(input).insert(&self.conn).await?;
        Ok(Self::map_file(inserted))
    }

    pub async fn add_many(&self, inputs: &[MediaFileInput]) -> Result<usize> {
        if inputs.is_empty() {
            return Ok(0);
        }
        for chunk in inputs.chunks(super::INSERT_CHUNK) {
            let models: Vec<_> = chunk.iter().map(Self::file_active_model).collect();
            MediaFiles::insert_many(models)
                .exec_without_returning(&self.conn)
                .await?;
        }
        Ok(inputs.len())
    }

    pub async fn get(&self, id: &str) -> Result<Option<MediaFile>> {
        let row = MediaFiles::find_by_id(id.to_string()).one(&self.conn).await?;
        Ok(row.map(Self::map_file))
    }

    pub async fn list(&self, filter: &ScannedItemFilter) -> Result<Vec<MediaFile>> {
        let mut query = MediaFiles::find().order_by_asc(media_files::Column::FilePath);
        if let Some(scan_id) = &filter.scan_id {
            query = query.filter(media_files::Column::ScanId.eq(scan_id.as_str()));
        }
        if let Some(library_path) = &filter.library_path {
            query = query.filter(media_files::Column::LibraryPath.eq(library_path.as_str()));
        }
        let rows = query
            .limit(filter.limit)
            .offset(filter.offset)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_file).collect())
    }

    pub async fn existing_files(&self, library_path: &str) -> Result<Vec<ExistingItem>> {
        let rows = MediaFiles::find()
            .filter(media_files::Column::LibraryPath.eq(library_path))
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|m| {
                let metadata: Option<serde_json::Value> = decode_opt(m.file_metadata.as_deref());
                ExistingItem {
                    size: u64::try_from(m.file_size).ok(),
                    modified: metadata
                        .as_ref()
                        .and_then(|v| v.get("modified"))
                        .and_then(|v| v.as_str())
                        .map(String::from),
                    media_type: m.media_type,
                    library_path: Some(m.library_path),
                    path: m.file_path,
                }
            })
            .collect())
    }

    pub async fn mark_assigned(
        &self,
        id: &str,
        assignment_id: &str,
        media_type: &str,
        media_id: &str,
    ) -> Result<()> {
        let model = media_files::ActiveModel {
            id: Set(id.to_string()),
            is_assigned: Set(true),
            assignment_id: Set(Some(assignment_id.to_string())),
            media_type: Set(Some(media_type.to_string())),
            media_id: Set(Some(media_id.to_string())),
            ..Default::default()
        };
        model.update(&self.conn).await?;
        Ok(())
    }

    pub async fn update_location(&self, id: &str, file_path: &str, file_name: &str) -> Result<()> {
        let model = media_files::ActiveModel {
            id: Set(id.to_string()),
            file_path: Set(file_path.to_string()),
            file_name: Set(file_name.to_string()),
            ..Default::default()
        };
        model.update(&self.conn).await?;
        Ok(())
    }

    // ========================================================================
    // Directories
    // ========================================================================

    pub async fn list_directories(&self, filter: &ScannedItemFilter) -> Result<Vec<MediaDirectory>> {
        let mut query = MediaDirectories::find().order_by_asc(media_directories::Column::Path);
        if let Some(scan_id) = &filter.scan_id {
            query = query.filter(media_directories::Column::ScanId.eq(scan_id.as_str()));
        }
        if let Some(library_path) = &filter.library_path {
            query = query.filter(media_directories::Column::LibraryPath.eq(library_path.as_str()));
        }
        let rows = query
            .limit(filter.limit)
            .offset(filter.offset)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_directory).collect())
    }

    pub async fn existing_directories(&self, library_path: &str) -> Result<Vec<ExistingItem>> {
        let rows = MediaDirectories::find()
            .filter(media_directories::Column::LibraryPath.eq(library_path))
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|m| {
                let metadata: Option<serde_json::Value> = decode_opt(m.metadata.as_deref());
                ExistingItem {
                    size: metadata
                        .as_ref()
                        .and_then(|v| v.get("size"))
                        .and_then(serde_json::Value::as_u64),
                    modified: metadata
                        .as_ref()
                        .and_then(|v| v.get("modified"))
                        .and_then(|v| v.as_str())
                        .map(String::from),
                    media_type: Some(m.media_type),
                    library_path: Some(m.library_path),
                    path: m.path,
                }
            })
            .collect())
    }
}
