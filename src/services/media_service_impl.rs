//! `SeaORM` implementation of the `MediaService` trait.

use crate::config::{LibraryConfig, ScannerConfig};
use crate::constants::limits::MAX_PAGE_SIZE;
use crate::constants::media::DEFAULT_VERSION;
use crate::db::Store;
use crate::library::naming::{
    is_jellyfin_folder_name, is_season_folder_name, sanitize_filename, split_title_year,
};
use crate::library::{JellyfinLayout, NamingOptions};
use crate::models::assignment::{
    AssignedMediaType, AssignmentInput, AssignmentStatus, HistoryEntry, MediaAssignment,
    SourceFile,
};
use crate::models::catalog::{AssignmentSummary, ReleaseMediaType};
use crate::models::media::{MediaFile, MediaFileInput};
use crate::parser::filename::{classify_file, parse_media_filename};
use crate::parser::size::gb_to_bytes;
use crate::services::error::LibraryError;
use crate::services::filesystem::{FileSystemManager, MoveOutcome};
use crate::services::media_service::{
    AssignEpisodeRequest, AssignMovieRequest, AssignOutcome, AssignmentUpdate, FileFailure,
    JellyfinChecks, JellyfinValidation, MediaError, MediaService, MoveFileRequest,
    OrganizeOutcome, ScanFilesOutcome, ScanFilesRequest,
};
use crate::services::metadata::MetadataExtractor;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub struct SeaOrmMediaService {
    store: Store,
    fs: FileSystemManager,
    extractor: MetadataExtractor,
    scanner: ScannerConfig,
    layout: JellyfinLayout,
}

impl SeaOrmMediaService {
    #[must_use]
    pub fn new(
        store: Store,
        fs: FileSystemManager,
        extractor: MetadataExtractor,
        scanner: ScannerConfig,
        library: LibraryConfig,
    ) -> Self {
        Self {
            store,
            fs,
            extractor,
            scanner,
            layout: JellyfinLayout::new(library),
        }
    }

    async fn process_file(
        &self,
        raw_path: &str,
        request: &ScanFilesRequest,
    ) -> Result<MediaFile, MediaError> {
        let path = Path::new(raw_path);
        let meta = self
            .fs
            .get_file_metadata(path, request.calculate_checksum)
            .await?;

        if !meta.is_file || !self.scanner.is_media(path) {
            return Err(LibraryError::InvalidFileType(raw_path.to_string()).into());
        }

        let limit = gb_to_bytes(self.fs.config().max_file_size_gb);
        if limit > 0 && meta.size > limit {
            return Err(MediaError::Validation(format!(
                "{raw_path} exceeds the {} GB size limit",
                self.fs.config().max_file_size_gb
            )));
        }

        let metadata = if self.scanner.is_video(path) {
            match self.extractor.extract_video_metadata(path).await {
                Ok(m) => Some(m),
                Err(e) => {
                    warn!(path = %raw_path, error = %e, "Storing file without media metadata");
                    None
                }
            }
        } else {
            None
        };

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(&meta.name);

        let input = MediaFileInput {
            user_id: request.user_id.clone(),
            library_path: request.library_path.clone(),
            file_path: meta.path.clone(),
            file_name: meta.name.clone(),
            file_extension: meta.extension.clone(),
            file_size: i64::try_from(meta.size).unwrap_or(i64::MAX),
            media_type: Some(classify_file(&meta.name).to_string()),
            scan_id: None,
            status: "processed".to_string(),
            metadata,
            checksum: meta.checksum.clone(),
            parsed_info: Some(parse_media_filename(stem)),
            file_metadata: serde_json::to_value(&meta).ok(),
            date_modified: meta.modified.clone(),
            date_created: meta.created.clone(),
        };

        Ok(self.store.add_media_file(&input).await?)
    }

    async fn create_assignments(
        &self,
        file_ids: &[String],
        template: &AssignmentInput,
    ) -> Result<(Vec<MediaAssignment>, Vec<String>), MediaError> {
        let mut assignments = Vec::new();
        let mut skipped = Vec::new();

        for file_id in file_ids {
            let Some(file) = self.store.get_media_file(file_id).await? else {
                warn!(file_id = %file_id, "Skipping unknown media file");
                skipped.push(file_id.clone());
                continue;
            };

            let input = AssignmentInput {
                file_id: file.id.clone(),
                source_file: SourceFile {
                    file_path: file.file_path.clone(),
                    file_name: file.file_name.clone(),
                    file_size: file.file_size,
                },
                ..template.clone()
            };

            let assignment = self.store.add_assignment(&input).await?;
            self.store
                .mark_media_file_assigned(
                    &file.id,
                    &assignment.id,
                    template.media_type.as_str(),
                    &template.media_id,
                )
                .await?;
            assignments.push(assignment);
        }

        Ok((assignments, skipped))
    }

    async fn movie_summary(&self, movie_id: &str) -> Result<AssignmentSummary, MediaError> {
        let assignments = self.store.list_assignments_for_media(movie_id).await?;

        let mut versions: Vec<String> = Vec::new();
        for version in assignments.iter().filter_map(|a| a.version.clone()) {
            if !versions.contains(&version) {
                versions.push(version);
            }
        }

        let has_physical_copy = self
            .store
            .list_releases(Some(ReleaseMediaType::Movie))
            .await?
            .iter()
            .any(|r| r.movie_ids.iter().any(|id| id == movie_id));

        Ok(AssignmentSummary {
            total_files: i64::try_from(assignments.len()).unwrap_or(i64::MAX),
            versions,
            has_physical_copy,
            total_file_size: assignments.iter().map(|a| a.source_file.file_size).sum(),
            last_updated: Some(Utc::now().to_rfc3339()),
        })
    }

    async fn jellyfin_target(
        &self,
        assignment: &MediaAssignment,
        extension: &str,
    ) -> Result<PathBuf, MediaError> {
        match assignment.media_type {
            AssignedMediaType::Movie => {
                let movie = self
                    .store
                    .get_movie(&assignment.media_id)
                    .await?
                    .ok_or_else(|| MediaError::NotFound(format!("Movie {}", assignment.media_id)))?;

                Ok(self.layout.movie_path(&NamingOptions {
                    title: movie.title,
                    year: movie.year,
                    version: Some(
                        assignment
                            .version
                            .clone()
                            .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
                    ),
                    extension: extension.to_string(),
                    ..Default::default()
                }))
            }
            AssignedMediaType::Episode => {
                let episode = self
                    .store
                    .get_episode(&assignment.media_id)
                    .await?
                    .ok_or_else(|| {
                        MediaError::NotFound(format!("Episode {}", assignment.media_id))
                    })?;
                let series_id = assignment
                    .series_id
                    .clone()
                    .unwrap_or_else(|| episode.series_id.clone());
                let series = self
                    .store
                    .get_series(&series_id)
                    .await?
                    .ok_or_else(|| MediaError::NotFound(format!("Series {series_id}")))?;

                Ok(self.layout.episode_path(&NamingOptions {
                    title: series.title,
                    year: series.year,
                    version: assignment.version.clone(),
                    season: Some(episode.season_number),
                    episode: Some(episode.episode_number),
                    episode_title: episode.title,
                    extension: extension.to_string(),
                }))
            }
        }
    }

    async fn record_failure(
        &self,
        mut assignment: MediaAssignment,
        source: &Path,
        target: &Path,
        reason: &str,
    ) {
        assignment.status = AssignmentStatus::Failed;
        assignment
            .organization_history
            .push(history_entry(source, target, "failed", Some(reason)));
        if let Err(e) = self.store.save_assignment_progress(&assignment).await {
            error!(assignment_id = %assignment.id, error = %e, "Failed to record organize failure");
        }
    }

    /// Finalizes the records after a successful move.
    async fn commit_organized(
        &self,
        assignment: &mut MediaAssignment,
        source: &Path,
        target: &Path,
    ) -> anyhow::Result<()> {
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.store
            .update_media_file_location(&assignment.file_id, &target.display().to_string(), &file_name)
            .await?;

        assignment.status = AssignmentStatus::Organized;
        assignment.is_organized = true;
        assignment.target_path = Some(target.display().to_string());
        assignment.date_organized = Some(Utc::now().to_rfc3339());
        assignment
            .organization_history
            .push(history_entry(source, target, "completed", None));
        *assignment = self.store.save_assignment_progress(assignment).await?;
        Ok(())
    }

    /// Folder titles are compared in their on-disk form, so catalog titles
    /// go through the same sanitizing the layout applies.
    async fn catalog_has_title(&self, title: &str, year: &str) -> Result<bool, MediaError> {
        let wanted = sanitize_filename(title).to_lowercase();
        let matches = |candidate: &str, candidate_year: Option<&str>| {
            sanitize_filename(candidate).to_lowercase() == wanted
                && candidate_year.is_some_and(|y| y.starts_with(year))
        };

        let movies = self.store.list_movies(MAX_PAGE_SIZE, 0).await?;
        if movies.iter().any(|m| matches(&m.title, m.year.as_deref())) {
            return Ok(true);
        }

        let series = self.store.list_series().await?;
        Ok(series.iter().any(|s| matches(&s.title, s.year.as_deref())))
    }
}

fn history_entry(source: &Path, target: &Path, status: &str, error: Option<&str>) -> HistoryEntry {
    HistoryEntry {
        timestamp: Utc::now().to_rfc3339(),
        operation: "organize".to_string(),
        source_path: source.display().to_string(),
        target_path: target.display().to_string(),
        status: status.to_string(),
        error: error.map(String::from),
    }
}

fn contains_video(dir: &Path, scanner: &ScannerConfig) -> bool {
    walkdir::WalkDir::new(dir)
        .max_depth(3)
        .into_iter()
        .filter_map(Result::ok)
        .any(|e| e.file_type().is_file() && scanner.is_video(e.path()))
}

#[async_trait]
impl MediaService for SeaOrmMediaService {
    async fn scan_files(&self, request: ScanFilesRequest) -> Result<ScanFilesOutcome, MediaError> {
        let mut processed_files = Vec::new();
        let mut errors = Vec::new();

        for path in &request.file_paths {
            match self.process_file(path, &request).await {
                Ok(file) => processed_files.push(file),
                Err(e) => {
                    warn!(path = %path, error = %e, "Failed to process media file");
                    errors.push(FileFailure {
                        file_path: path.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            event = "media_files_scanned",
            processed = processed_files.len(),
            failed = errors.len(),
            "Processed media files"
        );

        Ok(ScanFilesOutcome {
            total_processed: processed_files.len(),
            total_errors: errors.len(),
            processed_files,
            errors,
        })
    }

    async fn get_file(&self, id: &str) -> Result<MediaFile, MediaError> {
        self.store
            .get_media_file(id)
            .await?
            .ok_or_else(|| MediaError::NotFound(format!("Media file {id}")))
    }

    async fn assign_to_movie(
        &self,
        request: AssignMovieRequest,
    ) -> Result<AssignOutcome, MediaError> {
        if self.store.get_movie(&request.movie_id).await?.is_none() {
            return Err(MediaError::NotFound(format!("Movie {}", request.movie_id)));
        }

        let template = AssignmentInput {
            user_id: request.user_id.clone(),
            file_id: String::new(),
            media_type: AssignedMediaType::Movie,
            media_id: request.movie_id.clone(),
            series_id: None,
            season_number: None,
            version: Some(
                request
                    .version
                    .clone()
                    .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            ),
            source_file: SourceFile::default(),
        };

        let (assignments, skipped_file_ids) =
            self.create_assignments(&request.file_ids, &template).await?;

        let summary = self.movie_summary(&request.movie_id).await?;
        self.store
            .update_movie_assignment_summary(&request.movie_id, &summary)
            .await?;

        info!(
            movie_id = %request.movie_id,
            assigned = assignments.len(),
            skipped = skipped_file_ids.len(),
            "Assigned files to movie"
        );

        Ok(AssignOutcome {
            assignments,
            skipped_file_ids,
            assignment_summary: Some(summary),
        })
    }

    async fn assign_to_episode(
        &self,
        request: AssignEpisodeRequest,
    ) -> Result<AssignOutcome, MediaError> {
        let episode = self
            .store
            .get_episode(&request.episode_id)
            .await?
            .ok_or_else(|| MediaError::NotFound(format!("Episode {}", request.episode_id)))?;
        if episode.series_id != request.series_id {
            return Err(MediaError::Validation(format!(
                "Episode {} does not belong to series {}",
                request.episode_id, request.series_id
            )));
        }
        if self.store.get_series(&request.series_id).await?.is_none() {
            return Err(MediaError::NotFound(format!("Series {}", request.series_id)));
        }

        let template = AssignmentInput {
            user_id: request.user_id.clone(),
            file_id: String::new(),
            media_type: AssignedMediaType::Episode,
            media_id: request.episode_id.clone(),
            series_id: Some(request.series_id.clone()),
            season_number: Some(request.season_number),
            version: request.version.clone(),
            source_file: SourceFile::default(),
        };

        let (assignments, skipped_file_ids) =
            self.create_assignments(&request.file_ids, &template).await?;

        let mut file_ids: Vec<String> = Vec::new();
        for assignment in self
            .store
            .list_assignments_for_media(&request.episode_id)
            .await?
        {
            if !file_ids.contains(&assignment.file_id) {
                file_ids.push(assignment.file_id);
            }
        }
        self.store
            .set_episode_files(&request.episode_id, &file_ids)
            .await?;

        Ok(AssignOutcome {
            assignments,
            skipped_file_ids,
            assignment_summary: None,
        })
    }

    async fn organize(
        &self,
        assignment_id: &str,
        target_folder: Option<&str>,
    ) -> Result<OrganizeOutcome, MediaError> {
        let mut assignment = self.get_assignment(assignment_id).await?;

        let source = match self.store.get_media_file(&assignment.file_id).await? {
            Some(file) => PathBuf::from(file.file_path),
            None => PathBuf::from(&assignment.source_file.file_path),
        };
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mkv")
            .to_string();

        let target = match target_folder.map(str::trim).filter(|f| !f.is_empty()) {
            Some(folder) => {
                let name = source
                    .file_name()
                    .ok_or_else(|| MediaError::Validation("Source has no file name".into()))?;
                Path::new(folder).join(name)
            }
            None => self.jellyfin_target(&assignment, &extension).await?,
        };

        // Already where it belongs: nothing to move.
        if source == target && target.is_file() {
            if !assignment.is_organized || assignment.status != AssignmentStatus::Organized {
                self.commit_organized(&mut assignment, &source, &target)
                    .await?;
            }
            debug!(assignment_id, target = %target.display(), "Assignment already organized");
            return Ok(OrganizeOutcome {
                assignment,
                source_path: source.display().to_string(),
                target_path: target.display().to_string(),
            });
        }

        assignment.status = AssignmentStatus::Organizing;
        assignment = self.store.save_assignment_progress(&assignment).await?;

        if let Err(e) = self.fs.move_file(&source, &target, false).await {
            warn!(
                assignment_id,
                source = %source.display(),
                target = %target.display(),
                error = %e,
                "Organize move failed"
            );
            self.record_failure(assignment, &source, &target, &e.to_string())
                .await;
            return Err(e.into());
        }

        let pending = assignment.clone();
        if let Err(e) = self.commit_organized(&mut assignment, &source, &target).await {
            error!(assignment_id, error = %e, "Record update failed after move, moving file back");
            if let Err(rollback) = self.fs.move_file(&target, &source, false).await {
                error!(
                    assignment_id,
                    target = %target.display(),
                    error = %rollback,
                    "Rollback move failed"
                );
            }
            let file_name = source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if let Err(revert) = self
                .store
                .update_media_file_location(&pending.file_id, &source.display().to_string(), &file_name)
                .await
            {
                warn!(assignment_id, error = %revert, "Could not restore file record location");
            }
            self.record_failure(pending, &source, &target, &format!("{e:#}"))
                .await;
            return Err(e.into());
        }

        info!(
            event = "media_organized",
            assignment_id,
            source = %source.display(),
            target = %target.display(),
            "Organized media file"
        );

        Ok(OrganizeOutcome {
            assignment,
            source_path: source.display().to_string(),
            target_path: target.display().to_string(),
        })
    }

    async fn move_media_file(&self, request: MoveFileRequest) -> Result<MoveOutcome, MediaError> {
        if let Some(file_id) = &request.file_id
            && self.store.get_media_file(file_id).await?.is_none()
        {
            return Err(MediaError::NotFound(format!("Media file {file_id}")));
        }

        let target = Path::new(&request.target_path);
        let outcome = self
            .fs
            .move_file(Path::new(&request.source_path), target, request.merge_contents)
            .await?;

        if let Some(file_id) = &request.file_id {
            let file_name = target
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            self.store
                .update_media_file_location(file_id, &request.target_path, &file_name)
                .await?;
        }

        Ok(outcome)
    }

    async fn get_assignment(&self, id: &str) -> Result<MediaAssignment, MediaError> {
        self.store
            .get_assignment(id)
            .await?
            .ok_or_else(|| MediaError::NotFound(format!("Assignment {id}")))
    }

    async fn update_assignment(
        &self,
        id: &str,
        update: AssignmentUpdate,
    ) -> Result<MediaAssignment, MediaError> {
        let status = update
            .status
            .as_deref()
            .map(str::parse::<AssignmentStatus>)
            .transpose()
            .map_err(|e| {
                MediaError::Validation(format!(
                    "{e}; expected one of assigned, organizing, organized, failed"
                ))
            })?;

        self.store
            .update_assignment(id, status, update.organization_history.as_deref())
            .await?
            .ok_or_else(|| MediaError::NotFound(format!("Assignment {id}")))
    }

    async fn validate_jellyfin(
        &self,
        folder_path: &str,
    ) -> Result<JellyfinValidation, MediaError> {
        let folder = self.fs.validate_path_security(Path::new(folder_path))?;
        let mut checks = JellyfinChecks::default();
        let mut issues = Vec::new();

        checks.folder_exists = folder.is_dir();
        if !checks.folder_exists {
            issues.push("Folder does not exist".to_string());
        }

        let name = folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let parent_name = folder
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        // Season folders take their title and year from the series folder.
        let named = if is_season_folder_name(&name) {
            split_title_year(&parent_name)
        } else {
            split_title_year(&name)
        };

        checks.naming_compliant = is_jellyfin_folder_name(&name) && named.is_some();
        if !checks.naming_compliant {
            issues.push(format!(
                "Folder name {name:?} should be \"Name (YYYY)\" or \"Season NN\" inside a series folder"
            ));
        }

        if checks.folder_exists {
            let dir = folder.clone();
            let scanner = self.scanner.clone();
            checks.files_present =
                tokio::task::spawn_blocking(move || contains_video(&dir, &scanner))
                    .await
                    .map_err(LibraryError::from)?;
        }
        if !checks.files_present {
            issues.push("No video files found".to_string());
        }

        if let Some((title, year)) = &named {
            checks.metadata_complete = self.catalog_has_title(title, year).await?;
        }
        if !checks.metadata_complete {
            issues.push("No catalog entry matches this folder".to_string());
        }

        let is_compliant = checks.folder_exists
            && checks.naming_compliant
            && checks.files_present
            && checks.metadata_complete;

        Ok(JellyfinValidation {
            folder_path: folder_path.to_string(),
            checks,
            issues,
            is_compliant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;
    use crate::models::catalog::{EpisodeInput, MovieInput, SeriesInput};
    use std::fs;

    struct Fixture {
        _tmp: tempfile::TempDir,
        root: PathBuf,
        store: Store,
        service: SeaOrmMediaService,
    }

    async fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap();
        let store = Store::with_pool_options("sqlite::memory:", 1, 1)
            .await
            .unwrap();
        let library = LibraryConfig {
            allowed_base_paths: vec![root.display().to_string()],
            jellyfin_root: root.join("library").display().to_string(),
            recycle_path: root.join(".trash").display().to_string(),
            ..LibraryConfig::default()
        };
        let tools = ToolsConfig {
            ffprobe_path: "/nonexistent/ffprobe".to_string(),
            ..ToolsConfig::default()
        };
        let service = SeaOrmMediaService::new(
            store.clone(),
            FileSystemManager::new(library.clone()),
            MetadataExtractor::new(tools, ScannerConfig::default()),
            ScannerConfig::default(),
            library,
        );
        Fixture {
            _tmp: tmp,
            root,
            store,
            service,
        }
    }

    async fn scanned_file(fx: &Fixture, name: &str) -> MediaFile {
        let path = fx.root.join("incoming").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"not really a video").unwrap();

        let outcome = fx
            .service
            .scan_files(ScanFilesRequest {
                file_paths: vec![path.display().to_string()],
                user_id: None,
                library_path: fx.root.join("incoming").display().to_string(),
                calculate_checksum: false,
            })
            .await
            .unwrap();
        assert_eq!(outcome.total_errors, 0, "{:?}", outcome.errors);
        outcome.processed_files.into_iter().next().unwrap()
    }

    async fn inception(store: &Store) -> String {
        store
            .add_movie(&MovieInput {
                title: "Inception".into(),
                year: Some("2010".into()),
                imdb_id: Some("tt1375666".into()),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_scan_files_collects_failures() {
        let fx = fixture().await;
        let notes = fx.root.join("notes.txt");
        fs::write(&notes, b"x").unwrap();

        let outcome = fx
            .service
            .scan_files(ScanFilesRequest {
                file_paths: vec![
                    notes.display().to_string(),
                    "/etc/passwd".to_string(),
                    fx.root.join("missing.mkv").display().to_string(),
                ],
                user_id: None,
                library_path: fx.root.display().to_string(),
                calculate_checksum: false,
            })
            .await
            .unwrap();

        assert_eq!(outcome.total_processed, 0);
        assert_eq!(outcome.total_errors, 3);
    }

    #[tokio::test]
    async fn test_scan_files_stores_parsed_info() {
        let fx = fixture().await;
        let file = scanned_file(&fx, "Inception (2010) 1080p.mkv").await;

        assert_eq!(file.media_type.as_deref(), Some("movie"));
        let parsed = file.parsed_info.unwrap();
        assert_eq!(parsed.title, "Inception");
        assert_eq!(parsed.year, Some(2010));
    }

    #[tokio::test]
    async fn test_assign_to_movie_updates_summary_and_skips_unknown() {
        let fx = fixture().await;
        let movie_id = inception(&fx.store).await;
        let file = scanned_file(&fx, "Inception (2010).mkv").await;

        let outcome = fx
            .service
            .assign_to_movie(AssignMovieRequest {
                file_ids: vec![file.id.clone(), "missing".into()],
                movie_id: movie_id.clone(),
                version: None,
                user_id: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.assignments.len(), 1);
        assert_eq!(outcome.skipped_file_ids, vec!["missing"]);
        let summary = outcome.assignment_summary.unwrap();
        assert_eq!(summary.total_files, 1);
        assert_eq!(summary.versions, vec![DEFAULT_VERSION]);

        let stored = fx.store.get_media_file(&file.id).await.unwrap().unwrap();
        assert!(stored.is_assigned);
        assert_eq!(stored.media_id.as_deref(), Some(movie_id.as_str()));
    }

    #[tokio::test]
    async fn test_assign_to_missing_movie_is_not_found() {
        let fx = fixture().await;
        let err = fx
            .service
            .assign_to_movie(AssignMovieRequest {
                file_ids: vec![],
                movie_id: "tt0000000".into(),
                version: None,
                user_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_organize_moves_into_jellyfin_layout() {
        let fx = fixture().await;
        let movie_id = inception(&fx.store).await;
        let file = scanned_file(&fx, "inception.2010.mkv").await;
        let outcome = fx
            .service
            .assign_to_movie(AssignMovieRequest {
                file_ids: vec![file.id.clone()],
                movie_id,
                version: Some("2160p".into()),
                user_id: None,
            })
            .await
            .unwrap();
        let assignment_id = outcome.assignments[0].id.clone();

        let organized = fx.service.organize(&assignment_id, None).await.unwrap();

        let expected = fx
            .root
            .join("library/Movies/Inception (2010)/Inception (2010) - 2160p.mkv");
        assert_eq!(PathBuf::from(&organized.target_path), expected);
        assert!(expected.exists());
        assert!(!Path::new(&file.file_path).exists());
        assert_eq!(organized.assignment.status, AssignmentStatus::Organized);
        assert!(organized.assignment.is_organized);
        assert_eq!(organized.assignment.organization_history.len(), 1);

        let stored = fx.store.get_media_file(&file.id).await.unwrap().unwrap();
        assert_eq!(PathBuf::from(stored.file_path), expected);
    }

    #[tokio::test]
    async fn test_organize_refuses_overwrite_and_marks_failed() {
        let fx = fixture().await;
        let movie_id = inception(&fx.store).await;
        let file = scanned_file(&fx, "inception.mkv").await;
        let outcome = fx
            .service
            .assign_to_movie(AssignMovieRequest {
                file_ids: vec![file.id.clone()],
                movie_id,
                version: None,
                user_id: None,
            })
            .await
            .unwrap();
        let assignment_id = outcome.assignments[0].id.clone();

        let taken = fx.root.join("taken");
        fs::create_dir_all(&taken).unwrap();
        fs::write(taken.join("inception.mkv"), b"other").unwrap();

        let err = fx
            .service
            .organize(&assignment_id, Some(&taken.display().to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Library(_)));
        assert!(Path::new(&file.file_path).exists());

        let stored = fx.service.get_assignment(&assignment_id).await.unwrap();
        assert_eq!(stored.status, AssignmentStatus::Failed);
        assert_eq!(stored.organization_history[0].status, "failed");
    }

    #[tokio::test]
    async fn test_organize_twice_keeps_assignment_organized() {
        let fx = fixture().await;
        let movie_id = inception(&fx.store).await;
        let file = scanned_file(&fx, "inception.2010.1080p.mkv").await;
        let outcome = fx
            .service
            .assign_to_movie(AssignMovieRequest {
                file_ids: vec![file.id.clone()],
                movie_id,
                version: None,
                user_id: None,
            })
            .await
            .unwrap();
        let assignment_id = outcome.assignments[0].id.clone();

        let first = fx.service.organize(&assignment_id, None).await.unwrap();
        let second = fx.service.organize(&assignment_id, None).await.unwrap();

        assert_eq!(first.target_path, second.target_path);
        assert!(Path::new(&second.target_path).exists());

        let stored = fx.service.get_assignment(&assignment_id).await.unwrap();
        assert_eq!(stored.status, AssignmentStatus::Organized);
        assert!(stored.is_organized);
        assert_eq!(stored.organization_history.len(), 1);
        assert_eq!(stored.organization_history[0].status, "completed");
    }

    #[tokio::test]
    async fn test_validate_jellyfin_accepts_organized_title_with_colon() {
        let fx = fixture().await;
        let movie_id = fx
            .store
            .add_movie(&MovieInput {
                title: "Mission: Impossible".into(),
                year: Some("1996".into()),
                imdb_id: Some("tt0117060".into()),
                ..Default::default()
            })
            .await
            .unwrap()
            .id;
        let file = scanned_file(&fx, "mission.impossible.1996.mkv").await;
        let outcome = fx
            .service
            .assign_to_movie(AssignMovieRequest {
                file_ids: vec![file.id.clone()],
                movie_id,
                version: None,
                user_id: None,
            })
            .await
            .unwrap();

        let organized = fx
            .service
            .organize(&outcome.assignments[0].id, None)
            .await
            .unwrap();
        let folder = Path::new(&organized.target_path).parent().unwrap();
        assert_eq!(folder, fx.root.join("library/Movies/Mission Impossible (1996)"));

        let report = fx
            .service
            .validate_jellyfin(&folder.display().to_string())
            .await
            .unwrap();
        assert!(report.checks.metadata_complete, "{:?}", report.issues);
        assert!(report.is_compliant, "{:?}", report.issues);
    }

    #[tokio::test]
    async fn test_assign_to_episode_updates_episode_files() {
        let fx = fixture().await;
        let series = fx
            .store
            .add_series(&SeriesInput {
                title: "Severance".into(),
                year: Some("2022".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let episode = fx
            .store
            .add_episode(
                &series.id,
                &EpisodeInput {
                    season_number: 1,
                    episode_number: 2,
                    title: None,
                },
            )
            .await
            .unwrap();
        let file = scanned_file(&fx, "Severance S01E02.mkv").await;

        fx.service
            .assign_to_episode(AssignEpisodeRequest {
                file_ids: vec![file.id.clone()],
                series_id: series.id.clone(),
                season_number: 1,
                episode_id: episode.id.clone(),
                version: None,
                user_id: None,
            })
            .await
            .unwrap();

        let stored = fx.store.get_episode(&episode.id).await.unwrap().unwrap();
        assert!(stored.has_file);
        assert_eq!(stored.file_id.as_deref(), Some(file.id.as_str()));
        assert_eq!(stored.file_count, 1);
    }

    #[tokio::test]
    async fn test_update_assignment_validates_status_and_replaces_history() {
        let fx = fixture().await;
        let movie_id = inception(&fx.store).await;
        let file = scanned_file(&fx, "inception.mkv").await;
        let outcome = fx
            .service
            .assign_to_movie(AssignMovieRequest {
                file_ids: vec![file.id],
                movie_id,
                version: None,
                user_id: None,
            })
            .await
            .unwrap();
        let id = outcome.assignments[0].id.clone();

        let err = fx
            .service
            .update_assignment(
                &id,
                AssignmentUpdate {
                    status: Some("archived".into()),
                    organization_history: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Validation(_)));

        let entry = HistoryEntry {
            timestamp: Utc::now().to_rfc3339(),
            operation: "manual".into(),
            source_path: "/a".into(),
            target_path: "/b".into(),
            status: "completed".into(),
            error: None,
        };
        let updated = fx
            .service
            .update_assignment(
                &id,
                AssignmentUpdate {
                    status: Some("organized".into()),
                    organization_history: Some(vec![entry.clone()]),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, AssignmentStatus::Organized);
        assert_eq!(updated.organization_history, vec![entry]);
    }

    #[tokio::test]
    async fn test_validate_jellyfin_folder() {
        let fx = fixture().await;
        inception(&fx.store).await;
        let folder = fx.root.join("Inception (2010)");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("Inception (2010).mkv"), b"x").unwrap();

        let report = fx
            .service
            .validate_jellyfin(&folder.display().to_string())
            .await
            .unwrap();
        assert!(report.is_compliant, "{:?}", report.issues);

        let messy = fx.root.join("inception_2010");
        fs::create_dir_all(&messy).unwrap();
        let report = fx
            .service
            .validate_jellyfin(&messy.display().to_string())
            .await
            .unwrap();
        assert!(!report.is_compliant);
        assert!(!report.checks.naming_compliant);
        assert!(!report.checks.files_present);
    }
}
