use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::clients::omdb::OmdbClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    FileSystemManager, ImageService, LibraryScanner, MediaService, MetadataExtractor,
    MovieFormService, SeaOrmMediaService, TaskManager,
};

/// One pooled client for OMDB and poster downloads.
pub fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(concat!("media-catalog/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub omdb: Arc<OmdbClient>,

    pub fs: FileSystemManager,

    pub extractor: MetadataExtractor,

    pub scanner: LibraryScanner,

    pub tasks: TaskManager,

    pub images: Arc<ImageService>,

    pub movie_form: Arc<MovieFormService>,

    pub media_service: Arc<dyn MediaService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client = build_shared_http_client(config.omdb.request_timeout_seconds)?;

        let omdb = Arc::new(OmdbClient::with_shared_client(
            http_client.clone(),
            config.omdb.base_url.clone(),
            config.omdb.api_key.clone(),
        ));

        let fs = FileSystemManager::new(config.library.clone());
        let extractor = MetadataExtractor::new(config.tools.clone(), config.scanner.clone());

        let scanner = LibraryScanner::new(
            config.scanner.clone(),
            fs.clone(),
            extractor.clone(),
            store.clone(),
        );

        let tasks = TaskManager::new(config.scanner.scan_worker_threads);

        let images = Arc::new(ImageService::new(http_client, fs.clone()));

        let mut movie_form = MovieFormService::new(omdb.clone(), Arc::new(store.clone()));
        if config.omdb.download_posters {
            movie_form = movie_form.with_poster_downloads(images.clone());
        }

        let media_service = Arc::new(SeaOrmMediaService::new(
            store.clone(),
            fs.clone(),
            extractor.clone(),
            config.scanner.clone(),
            config.library.clone(),
        )) as Arc<dyn MediaService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            omdb,
            fs,
            extractor,
            scanner,
            tasks,
            images,
            movie_form: Arc::new(movie_form),
            media_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
