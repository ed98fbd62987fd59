use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "scan_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub library_path: String,
    pub status: String,
    pub total_items: i64,
    pub processed_items: i64,
    pub files_found: i64,
    pub directories_found: i64,
    pub start_time: String,
    pub end_time: Option<String>,
    pub elapsed_seconds: f64,
    pub errors: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
