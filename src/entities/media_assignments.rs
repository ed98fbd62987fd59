use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "media_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: Option<String>,
    pub file_id: String,
    /// "movie" or "episode"
    pub media_type: String,
    pub media_id: String,
    pub series_id: Option<String>,
    pub season_number: Option<i32>,
    pub version: Option<String>,
    pub status: String,
    pub is_organized: bool,
    pub target_path: Option<String>,
    /// JSON `{filePath, fileName, fileSize}`
    pub source_file: String,
    /// JSON array of history entries
    pub organization_history: String,
    pub date_assigned: String,
    pub date_organized: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
