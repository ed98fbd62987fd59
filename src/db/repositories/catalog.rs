use crate::entities::{episodes, people, prelude::*, releases, series};
use crate::models::catalog::{
    Episode, EpisodeInput, Person, PersonInput, PersonRole, Release, ReleaseInput,
    ReleaseMediaType, Series as SeriesModel, SeriesInput,
};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use super::{decode_list, decode_opt, encode, encode_opt, now};

/// People, releases, series and episodes.
pub struct CatalogRepository {
    conn: DatabaseConnection,
}

impl CatalogRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_person(p: people::Model) -> Person {
        Person {
            id: p.id,
            role: p.role.parse().unwrap_or(PersonRole::Actor),
            full_name: p.full_name,
            birthplace: p.birthplace,
            birthday: p.birthday,
            notes: p.notes,
            movie_ids: decode_list(&p.movie_ids),
            series_ids: decode_list(&p.series_ids),
            created_at: p.created_at,
        }
    }

    fn map_release(r: releases::Model) -> Release {
        Release {
            id: r.id,
            title: r.title,
            year: r.year,
            media_type: r.media_type.parse().unwrap_or(ReleaseMediaType::Movie),
            disc_ids: decode_list(&r.disc_ids),
            extras: decode_list(&r.extras),
            episode_ids: decode_list(&r.episode_ids),
            movie_ids: decode_list(&r.movie_ids),
            season_ids: decode_list(&r.season_ids),
            series_ids: decode_list(&r.series_ids),
            created_at: r.created_at,
        }
    }

    fn map_series(s: series::Model) -> SeriesModel {
        SeriesModel {
            id: s.id,
            title: s.title,
            year: s.year,
            imdb_id: s.imdb_id,
            plot: s.plot,
            genres: decode_list(&s.genres),
            total_seasons: s.total_seasons,
            omdb_data: decode_opt(s.omdb_data.as_deref()),
            created_at: s.created_at,
        }
    }

    fn map_episode(e: episodes::Model) -> Episode {
        Episode {
            id: e.id,
            series_id: e.series_id,
            season_number: e.season_number,
            episode_number: e.episode_number,
            title: e.title,
            has_file: e.has_file,
            file_id: e.file_id,
            file_count: e.file_count,
        }
    }

    // ========================================================================
    // People
    // ========================================================================

    pub async fn add_person(&self, input: &PersonInput) -> Result<Person> {
        let model = people::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            role: Set(input.role.as_str().to_string()),
            full_name: Set(input.full_name.trim().to_string()),
            birthplace: Set(input.birthplace.clone()),
            birthday: Set(input.birthday.clone()),
            notes: Set(input.notes.clone()),
            movie_ids: Set(encode(&input.movie_ids)),
            series_ids: Set(encode(&input.series_ids)),
            created_at: Set(now()),
        };
        let inserted = model.insert(&self.conn).await?;
        info!("Added {} {}", input.role, input.full_name);
        Ok(Self::map_person(inserted))
    }

    pub async fn get_person(&self, id: &str) -> Result<Option<Person>> {
        let row = People::find_by_id(id.to_string()).one(&self.conn).await?;
        Ok(row.map(Self::map_person))
    }

    pub async fn list_people(&self, role: Option<PersonRole>) -> Result<Vec<Person>> {
        let mut query = People::find().order_by_asc(people::Column::FullName);
        if let Some(role) = role {
            query = query.filter(people::Column::Role.eq(role.as_str()));
        }
        let rows = query.all(&self.conn).await?;
        Ok(rows.into_iter().map(Self::map_person).collect())
    }

    pub async fn find_person_by_name(
        &self,
        role: PersonRole,
        full_name: &str,
    ) -> Result<Option<Person>> {
        let row = People::find()
            .filter(people::Column::Role.eq(role.as_str()))
            .filter(people::Column::FullName.eq(full_name.trim()))
            .one(&self.conn)
            .await?;
        Ok(row.map(Self::map_person))
    }

    pub async fn update_person(&self, id: &str, input: &PersonInput) -> Result<Option<Person>> {
        let Some(existing) = People::find_by_id(id.to_string()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut model: people::ActiveModel = existing.into();
        model.role = Set(input.role.as_str().to_string());
        model.full_name = Set(input.full_name.trim().to_string());
        model.birthplace = Set(input.birthplace.clone());
        model.birthday = Set(input.birthday.clone());
        model.notes = Set(input.notes.clone());
        model.movie_ids = Set(encode(&input.movie_ids));
        model.series_ids = Set(encode(&input.series_ids));
        let updated = model.update(&self.conn).await?;
        Ok(Some(Self::map_person(updated)))
    }

    /// Appends `movie_id` to the back-references unless already present.
    pub async fn link_person_movie(&self, id: &str, movie_id: &str) -> Result<Option<Person>> {
        let Some(existing) = People::find_by_id(id.to_string()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut movie_ids: Vec<String> = decode_list(&existing.movie_ids);
        if movie_ids.iter().any(|m| m == movie_id) {
            return Ok(Some(Self::map_person(existing)));
        }
        movie_ids.push(movie_id.to_string());

        let mut model: people::ActiveModel = existing.into();
        model.movie_ids = Set(encode(&movie_ids));
        let updated = model.update(&self.conn).await?;
        Ok(Some(Self::map_person(updated)))
    }

    pub async fn delete_person(&self, id: &str) -> Result<bool> {
        let result = People::delete_by_id(id.to_string())
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Releases
    // ========================================================================

    pub async fn add_release(&self, input: &ReleaseInput) -> Result<Release> {
        let model = releases::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            title: Set(input.title.trim().to_string()),
            year: Set(input.year),
            media_type: Set(input.media_type.as_str().to_string()),
            disc_ids: Set(encode(&input.disc_ids)),
            extras: Set(encode(&input.extras)),
            episode_ids: Set(encode(&input.episode_ids)),
            movie_ids: Set(encode(&input.movie_ids)),
            season_ids: Set(encode(&input.season_ids)),
            series_ids: Set(encode(&input.series_ids)),
            created_at: Set(now()),
        };
        let inserted = model.insert(&self.conn).await?;
        Ok(Self::map_release(inserted))
    }

    pub async fn get_release(&self, id: &str) -> Result<Option<Release>> {
        let row = Releases::find_by_id(id.to_string()).one(&self.conn).await?;
        Ok(row.map(Self::map_release))
    }

    pub async fn list_releases(&self, media_type: Option<ReleaseMediaType>) -> Result<Vec<Release>> {
        let mut query = Releases::find().order_by_asc(releases::Column::Title);
        if let Some(media_type) = media_type {
            query = query.filter(releases::Column::MediaType.eq(media_type.as_str()));
        }
        let rows = query.all(&self.conn).await?;
        Ok(rows.into_iter().map(Self::map_release).collect())
    }

    pub async fn delete_release(&self, id: &str) -> Result<bool> {
        let result = Releases::delete_by_id(id.to_string())
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Series & Episodes
    // ========================================================================

    pub async fn add_series(&self, input: &SeriesInput) -> Result<SeriesModel> {
        let model = series::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            title: Set(input.title.trim().to_string()),
            year: Set(input.year.clone()),
            imdb_id: Set(input.imdb_id.clone()),
            plot: Set(input.plot.clone()),
            genres: Set(encode(&input.genres)),
            total_seasons: Set(input.total_seasons),
            omdb_data: Set(encode_opt(input.omdb_data.as_ref())),
            created_at: Set(now()),
        };
        let inserted = model.insert(&self.conn).await?;
        info!("Added series {}", input.title);
        Ok(Self::map_series(inserted))
    }

    pub async fn get_series(&self, id: &str) -> Result<Option<SeriesModel>> {
        let row = Series::find_by_id(id.to_string()).one(&self.conn).await?;
        Ok(row.map(Self::map_series))
    }

    pub async fn list_series(&self) -> Result<Vec<SeriesModel>> {
        let rows = Series::find()
            .order_by_asc(series::Column::Title)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_series).collect())
    }

    pub async fn add_episode(&self, series_id: &str, input: &EpisodeInput) -> Result<Episode> {
        let model = episodes::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            series_id: Set(series_id.to_string()),
            season_number: Set(input.season_number),
            episode_number: Set(input.episode_number),
            title: Set(input.title.clone()),
            has_file: Set(false),
            file_id: Set(None),
            file_count: Set(0),
        };
        let inserted = model.insert(&self.conn).await?;
        Ok(Self::map_episode(inserted))
    }

    pub async fn get_episode(&self, id: &str) -> Result<Option<Episode>> {
        let row = Episodes::find_by_id(id.to_string()).one(&self.conn).await?;
        Ok(row.map(Self::map_episode))
    }

    pub async fn list_episodes(&self, series_id: &str) -> Result<Vec<Episode>> {
        let rows = Episodes::find()
            .filter(episodes::Column::SeriesId.eq(series_id))
            .order_by_asc(episodes::Column::SeasonNumber)
            .order_by_asc(episodes::Column::EpisodeNumber)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_episode).collect())
    }

    /// Records the files now backing this episode. The first becomes the primary one.
    pub async fn set_episode_files(&self, id: &str, file_ids: &[String]) -> Result<Option<Episode>> {
        let Some(existing) = Episodes::find_by_id(id.to_string()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut model: episodes::ActiveModel = existing.into();
        model.has_file = Set(!file_ids.is_empty());
        model.file_id = Set(file_ids.first().cloned());
        model.file_count = Set(i32::try_from(file_ids.len()).unwrap_or(i32::MAX));
        let updated = model.update(&self.conn).await?;
        Ok(Some(Self::map_episode(updated)))
    }
}
