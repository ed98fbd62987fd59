use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "people")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// "director" or "actor"
    pub role: String,
    pub full_name: String,
    pub birthplace: Option<String>,
    pub birthday: Option<String>,
    pub notes: Option<String>,
    pub movie_ids: String,
    pub series_ids: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
