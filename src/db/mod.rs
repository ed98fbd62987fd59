use crate::models::assignment::{AssignmentInput, AssignmentStatus, HistoryEntry, MediaAssignment};
use crate::models::catalog::{
    AssignmentSummary, Episode, EpisodeInput, Movie, MovieInput, Person, PersonInput, PersonRole,
    Release, ReleaseInput, ReleaseMediaType, Series, SeriesInput,
};
use crate::models::media::{LibraryPath, MediaDirectory, MediaFile, MediaFileInput};
use crate::models::scan::{ExistingItem, ScanProgress};
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::media_file::ScannedItemFilter;
pub use repositories::scan::SavedScan;

/// Failures callers are expected to tell apart from plain database errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} already exists")]
    AlreadyExists { entity: &'static str, id: String },
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:");
        if !path_str.starts_with(":memory:") {
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn movie_repo(&self) -> repositories::movie::MovieRepository {
        repositories::movie::MovieRepository::new(self.conn.clone())
    }

    fn catalog_repo(&self) -> repositories::catalog::CatalogRepository {
        repositories::catalog::CatalogRepository::new(self.conn.clone())
    }

    fn media_file_repo(&self) -> repositories::media_file::MediaFileRepository {
        repositories::media_file::MediaFileRepository::new(self.conn.clone())
    }

    fn scan_repo(&self) -> repositories::scan::ScanRepository {
        repositories::scan::ScanRepository::new(self.conn.clone())
    }

    fn assignment_repo(&self) -> repositories::assignment::AssignmentRepository {
        repositories::assignment::AssignmentRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Movies
    // ========================================================================

    pub async fn add_movie(&self, input: &MovieInput) -> Result<Movie> {
        self.movie_repo().add(input).await
    }

    pub async fn get_movie(&self, id: &str) -> Result<Option<Movie>> {
        self.movie_repo().get(id).await
    }

    pub async fn find_movie_by_imdb_id(&self, imdb_id: &str) -> Result<Option<Movie>> {
        self.movie_repo().find_by_imdb_id(imdb_id).await
    }

    pub async fn list_movies(&self, limit: u64, offset: u64) -> Result<Vec<Movie>> {
        self.movie_repo().list(limit, offset).await
    }

    pub async fn count_movies(&self) -> Result<u64> {
        self.movie_repo().count().await
    }

    pub async fn update_movie(&self, id: &str, input: &MovieInput) -> Result<Option<Movie>> {
        self.movie_repo().update(id, input).await
    }

    pub async fn update_movie_assignment_summary(
        &self,
        id: &str,
        summary: &AssignmentSummary,
    ) -> Result<()> {
        self.movie_repo()
            .update_assignment_summary(id, summary)
            .await
    }

    pub async fn delete_movie(&self, id: &str) -> Result<bool> {
        self.movie_repo().delete(id).await
    }

    // ========================================================================
    // People, releases, series
    // ========================================================================

    pub async fn add_person(&self, input: &PersonInput) -> Result<Person> {
        self.catalog_repo().add_person(input).await
    }

    pub async fn get_person(&self, id: &str) -> Result<Option<Person>> {
        self.catalog_repo().get_person(id).await
    }

    pub async fn list_people(&self, role: Option<PersonRole>) -> Result<Vec<Person>> {
        self.catalog_repo().list_people(role).await
    }

    pub async fn find_person_by_name(
        &self,
        role: PersonRole,
        full_name: &str,
    ) -> Result<Option<Person>> {
        self.catalog_repo().find_person_by_name(role, full_name).await
    }

    pub async fn update_person(&self, id: &str, input: &PersonInput) -> Result<Option<Person>> {
        self.catalog_repo().update_person(id, input).await
    }

    pub async fn link_person_movie(&self, id: &str, movie_id: &str) -> Result<Option<Person>> {
        self.catalog_repo().link_person_movie(id, movie_id).await
    }

    pub async fn delete_person(&self, id: &str) -> Result<bool> {
        self.catalog_repo().delete_person(id).await
    }

    pub async fn add_release(&self, input: &ReleaseInput) -> Result<Release> {
        self.catalog_repo().add_release(input).await
    }

    pub async fn get_release(&self, id: &str) -> Result<Option<Release>> {
        self.catalog_repo().get_release(id).await
    }

    pub async fn list_releases(&self, media_type: Option<ReleaseMediaType>) -> Result<Vec<Release>> {
        self.catalog_repo().list_releases(media_type).await
    }

    pub async fn delete_release(&self, id: &str) -> Result<bool> {
        self.catalog_repo().delete_release(id).await
    }

    pub async fn add_series(&self, input: &SeriesInput) -> Result<Series> {
        self.catalog_repo().add_series(input).await
    }

    pub async fn get_series(&self, id: &str) -> Result<Option<Series>> {
        self.catalog_repo().get_series(id).await
    }

    pub async fn list_series(&self) -> Result<Vec<Series>> {
        self.catalog_repo().list_series().await
    }

    pub async fn add_episode(&self, series_id: &str, input: &EpisodeInput) -> Result<Episode> {
        self.catalog_repo().add_episode(series_id, input).await
    }

    pub async fn get_episode(&self, id: &str) -> Result<Option<Episode>> {
        self.catalog_repo().get_episode(id).await
    }

    pub async fn list_episodes(&self, series_id: &str) -> Result<Vec<Episode>> {
        self.catalog_repo().list_episodes(series_id).await
    }

    pub async fn set_episode_files(
        &self,
        id: &str,
        file_ids: &[String],
    ) -> Result<Option<Episode>> {
        self.catalog_repo().set_episode_files(id, file_ids).await
    }

    // ========================================================================
    // Media files & scans
    // ========================================================================

    pub async fn add_media_file(&self, input: &MediaFileInput) -> Result<MediaFile> {
        self.media_file_repo().add(input).await
    }

    pub async fn get_media_file(&self, id: &str) -> Result<Option<MediaFile>> {
        self.media_file_repo().get(id).await
    }

    pub async fn list_media_files(&self, filter: &ScannedItemFilter) -> Result<Vec<MediaFile>> {
        self.media_file_repo().list(filter).await
    }

    pub async fn list_media_directories(
        &self,
        filter: &ScannedItemFilter,
    ) -> Result<Vec<MediaDirectory>> {
        self.media_file_repo().list_directories(filter).await
    }

    pub async fn existing_library_items(
        &self,
        library_path: &str,
    ) -> Result<(Vec<ExistingItem>, Vec<ExistingItem>)> {
        let repo = self.media_file_repo();
        let files = repo.existing_files(library_path).await?;
        let directories = repo.existing_directories(library_path).await?;
        Ok((files, directories))
    }

    pub async fn mark_media_file_assigned(
        &self,
        id: &str,
        assignment_id: &str,
        media_type: &str,
        media_id: &str,
    ) -> Result<()> {
        self.media_file_repo()
            .mark_assigned(id, assignment_id, media_type, media_id)
            .await
    }

    pub async fn update_media_file_location(
        &self,
        id: &str,
        file_path: &str,
        file_name: &str,
    ) -> Result<()> {
        self.media_file_repo()
            .update_location(id, file_path, file_name)
            .await
    }

    pub async fn save_scan(&self, progress: &ScanProgress) -> Result<SavedScan> {
        self.scan_repo().save(progress).await
    }

    pub async fn add_library_path(&self, path: &str, name: Option<&str>) -> Result<LibraryPath> {
        self.scan_repo().add_library_path(path, name).await
    }

    pub async fn list_library_paths(&self) -> Result<Vec<LibraryPath>> {
        self.scan_repo().list_library_paths().await
    }

    // ========================================================================
    // Assignments
    // ========================================================================

    pub async fn add_assignment(&self, input: &AssignmentInput) -> Result<MediaAssignment> {
        self.assignment_repo().add(input).await
    }

    pub async fn get_assignment(&self, id: &str) -> Result<Option<MediaAssignment>> {
        self.assignment_repo().get(id).await
    }

    pub async fn list_assignments_for_media(&self, media_id: &str) -> Result<Vec<MediaAssignment>> {
        self.assignment_repo().list_for_media(media_id).await
    }

    pub async fn save_assignment_progress(
        &self,
        assignment: &MediaAssignment,
    ) -> Result<MediaAssignment> {
        self.assignment_repo().save_progress(assignment).await
    }

    pub async fn update_assignment(
        &self,
        id: &str,
        status: Option<AssignmentStatus>,
        history: Option<&[HistoryEntry]>,
    ) -> Result<Option<MediaAssignment>> {
        self.assignment_repo().update(id, status, history).await
    }
}
