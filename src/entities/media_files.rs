use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "media_files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: Option<String>,
    pub library_path: String,
    pub file_path: String,
    pub file_name: String,
    pub file_extension: String,
    pub file_size: i64,
    pub media_type: Option<String>,
    pub scan_id: Option<String>,
    /// "discovered" (from a library scan) or "scanned" (probed on request)
    pub status: String,
    pub container_format: Option<String>,
    pub duration: Option<f64>,
    pub overall_bitrate: Option<i64>,
    pub video_metadata: Option<String>,
    pub audio_tracks: String,
    pub subtitle_tracks: String,
    pub checksum: Option<String>,
    pub is_assigned: bool,
    pub assignment_id: Option<String>,
    pub media_id: Option<String>,
    pub parsed_info: Option<String>,
    pub file_metadata: Option<String>,
    pub date_added: String,
    pub date_modified: Option<String>,
    pub date_created: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
