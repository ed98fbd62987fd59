use crate::db::StoreError;
use crate::entities::{movies, prelude::*};
use crate::models::catalog::{AssignmentSummary, Movie, MovieInput};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};
use tracing::info;

use super::{decode_list, decode_opt, encode, encode_opt, now};

pub struct MovieRepository {
    conn: DatabaseConnection,
}

impl MovieRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: movies::Model) -> Movie {
        Movie {
            id: m.id,
            title: m.title,
            year: m.year,
            rated: m.rated,
            release_date: m.release_date,
            runtime: m.runtime,
            plot: m.plot,
            directors: decode_list(&m.directors),
            writers: decode_list(&m.writers),
            cast: decode_list(&m.cast),
            genres: decode_list(&m.genres),
            languages: decode_list(&m.languages),
            countries: decode_list(&m.countries),
            ratings: decode_list(&m.ratings),
            links: decode_list(&m.links),
            image_files: decode_list(&m.image_files),
            omdb_data: decode_opt(m.omdb_data.as_deref()),
            imdb_id: m.imdb_id,
            assignment_summary: decode_opt(m.assignment_summary.as_deref()),
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    fn fill_fields(model: &mut movies::ActiveModel, input: &MovieInput) {
        model.title = Set(input.title.trim().to_string());
        model.year = Set(input.year.clone());
        model.rated = Set(input.rated.clone());
        model.release_date = Set(input.release_date.clone());
        model.runtime = Set(input.runtime.clone());
        model.plot = Set(input.plot.clone());
        model.directors = Set(encode(&input.directors));
        model.writers = Set(encode(&input.writers));
        model.cast = Set(encode(&input.cast));
        model.genres = Set(encode(&input.genres));
        model.languages = Set(encode(&input.languages));
        model.countries = Set(encode(&input.countries));
        model.ratings = Set(encode(&input.ratings));
        model.links = Set(encode(&input.links));
        model.image_files = Set(encode(&input.image_files));
        model.omdb_data = Set(encode_opt(input.omdb_data.as_ref()));
        model.imdb_id = Set(input.imdb_id.clone());
        model.updated_at = Set(now());
    }

    /// The provider id becomes the primary key when present.
    pub async fn add(&self, input: &MovieInput) -> Result<Movie> {
        let id = input
            .imdb_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut model = movies::ActiveModel {
            id: Set(id.clone()),
            assignment_summary: Set(None),
            created_at: Set(now()),
            ..Default::default()
        };
        Self::fill_fields(&mut model, input);

        if let Err(e) = Movies::insert(model).exec(&self.conn).await {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                return Err(StoreError::AlreadyExists {
                    entity: "Movie",
                    id,
                }
                .into());
            }
            return Err(e.into());
        }

        info!(movie_id = %id, "Added movie {}", input.title);
        self.get(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Movie {id} missing after insert"))
    }

    pub async fn get(&self, id: &str) -> Result<Option<Movie>> {
        let row = Movies::find_by_id(id.to_string()).one(&self.conn).await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn find_by_imdb_id(&self, imdb_id: &str) -> Result<Option<Movie>> {
        let row = Movies::find()
            .filter(movies::Column::ImdbId.eq(imdb_id))
            .one(&self.conn)
            .await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn list(&self, limit: u64, offset: u64) -> Result<Vec<Movie>> {
        let rows = Movies::find()
            .order_by_asc(movies::Column::Title)
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Movies::find().count(&self.conn).await?)
    }

    pub async fn update(&self, id: &str, input: &MovieInput) -> Result<Option<Movie>> {
        let Some(existing) = Movies::find_by_id(id.to_string()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut model: movies::ActiveModel = existing.into();
        Self::fill_fields(&mut model, input);
        let updated = model.update(&self.conn).await?;
        Ok(Some(Self::map_model(updated)))
    }

    pub async fn update_assignment_summary(
        &self,
        id: &str,
        summary: &AssignmentSummary,
    ) -> Result<()> {
        let model = movies::ActiveModel {
            id: Set(id.to_string()),
            assignment_summary: Set(encode_opt(Some(summary))),
            updated_at: Set(now()),
            ..Default::default()
        };
        model.update(&self.conn).await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = Movies::delete_by_id(id.to_string())
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
