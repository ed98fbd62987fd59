use sea_orm::entity::prelude::*;

/// List columns (`directors`, `cast`, ...) hold JSON arrays of strings.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "movies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub year: Option<String>,
    pub rated: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<String>,
    pub plot: Option<String>,
    pub directors: String,
    pub writers: String,
    pub cast: String,
    pub genres: String,
    pub languages: String,
    pub countries: String,
    /// JSON array of `{source, value}`
    pub ratings: String,
    pub links: String,
    pub image_files: String,
    /// Raw provider payload as JSON
    pub omdb_data: Option<String>,
    #[sea_orm(unique)]
    pub imdb_id: Option<String>,
    pub assignment_summary: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
