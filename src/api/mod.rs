use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    FileSystemManager, ImageService, LibraryScanner, MediaService, MetadataExtractor,
    MovieFormService, TaskManager,
};
use crate::state::SharedState;

mod catalog;
mod error;
mod files;
mod images;
mod library;
mod media;
mod metadata;
mod observability;
mod system;
mod tasks;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn fs(&self) -> &FileSystemManager {
        &self.shared.fs
    }

    #[must_use]
    pub fn extractor(&self) -> &MetadataExtractor {
        &self.shared.extractor
    }

    #[must_use]
    pub fn scanner(&self) -> &LibraryScanner {
        &self.shared.scanner
    }

    #[must_use]
    pub fn tasks(&self) -> &TaskManager {
        &self.shared.tasks
    }

    #[must_use]
    pub fn images(&self) -> &Arc<ImageService> {
        &self.shared.images
    }

    #[must_use]
    pub fn movie_form(&self) -> &Arc<MovieFormService> {
        &self.shared.movie_form
    }

    #[must_use]
    pub fn media_service(&self) -> &Arc<dyn MediaService> {
        &self.shared.media_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (images_path, cors_origins) = {
        let config = state.config().read().await;
        (
            config.library.images_path.clone(),
            config.server.cors_allowed_origins.clone(),
        )
    };

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .nest("/api", api_router())
        .nest_service("/images", tower_http::services::ServeDir::new(images_path))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
        .with_state(state)
}

fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // catalog
        .route(
            "/movies",
            get(catalog::list_movies).post(catalog::create_movie),
        )
        .route("/movies/search", post(catalog::search_movies))
        .route("/movies/select", post(catalog::select_movie))
        .route(
            "/movies/{id}",
            get(catalog::get_movie)
                .put(catalog::update_movie)
                .delete(catalog::delete_movie),
        )
        .route(
            "/people",
            get(catalog::list_people).post(catalog::create_person),
        )
        .route(
            "/people/{id}",
            get(catalog::get_person)
                .put(catalog::update_person)
                .delete(catalog::delete_person),
        )
        .route("/people/{id}/movies", post(catalog::link_person_movie))
        .route(
            "/releases",
            get(catalog::list_releases).post(catalog::create_release),
        )
        .route(
            "/releases/{id}",
            get(catalog::get_release).delete(catalog::delete_release),
        )
        .route(
            "/series",
            get(catalog::list_series).post(catalog::create_series),
        )
        .route("/series/{id}", get(catalog::get_series))
        .route(
            "/series/{id}/episodes",
            get(catalog::list_episodes).post(catalog::create_episode),
        )
        // files
        .route("/files/rename", post(files::rename_file))
        .route("/files/move", post(files::move_file))
        .route("/files/delete", post(files::delete_file))
        .route("/files/metadata", post(files::file_metadata))
        .route("/files/folders/create", post(files::create_folder))
        .route("/files/folders/list", post(files::list_folder))
        .route("/files/bulk/move", post(files::bulk_move))
        .route("/files/path/exists", post(files::path_exists))
        .route("/files/validate", post(files::validate_operation))
        .route("/files/trash", get(files::list_trash))
        .route("/files/trash/restore", post(files::restore_from_trash))
        .route("/files/trash/empty", post(files::empty_trash))
        .route("/files/trash/cleanup", post(files::cleanup_trash))
        // library
        .route("/library/scan", post(library::start_scan))
        .route("/library/scan/status/{id}", get(library::scan_status))
        .route("/library/scan/results/{id}", get(library::scan_results))
        .route("/library/scan/stop", post(library::stop_scan))
        .route("/library/scans", get(library::list_scans))
        .route("/library/scan/cleanup/{id}", delete(library::cleanup_scan))
        .route("/library/scans/cleanup", delete(library::cleanup_scans))
        .route("/library/verify", post(library::verify_files))
        .route("/library/scanned-files", get(library::scanned_files))
        .route(
            "/library/scanned-directories",
            get(library::scanned_directories),
        )
        .route(
            "/library/paths",
            get(library::list_library_paths).post(library::add_library_path),
        )
        // metadata
        .route("/metadata/extract", post(metadata::extract))
        .route("/metadata/batch", post(metadata::batch))
        .route("/metadata/formats", get(metadata::formats))
        // media
        .route("/media/files/scan", post(media::scan_files))
        .route("/media/files/{id}", get(media::get_file))
        .route("/media/assign/movie", post(media::assign_movie))
        .route("/media/assign/episode", post(media::assign_episode))
        .route("/media/organize/{assignment_id}", post(media::organize))
        .route("/media/jellyfin/validate", post(media::validate_jellyfin))
        .route(
            "/assignments/{id}",
            get(media::get_assignment).patch(media::update_assignment),
        )
        // tasks
        .route("/tasks", get(tasks::list_tasks))
        .route("/tasks/cleanup", delete(tasks::cleanup_tasks))
        .route("/tasks/{id}", get(tasks::get_task))
        .route("/tasks/{id}/cancel", post(tasks::cancel_task))
        .route("/images/upload", post(images::upload_images))
        .route("/metrics", get(observability::get_metrics))
}
