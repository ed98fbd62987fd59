use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub library: LibraryConfig,

    pub scanner: ScannerConfig,

    pub tools: ToolsConfig,

    pub omdb: OmdbConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// "pretty" or "json"
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/media-catalog.db".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8082,
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:3001".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// File operations are confined to these roots. Empty allows any path.
    pub allowed_base_paths: Vec<String>,

    /// Root under which organized media is laid out for Jellyfin.
    pub jellyfin_root: String,

    pub movie_naming_format: String,

    pub episode_naming_format: String,

    pub recycle_path: String,

    pub recycle_cleanup_days: u32,

    pub use_trash_for_deletes: bool,

    /// Hash files before and after a move and fail on mismatch
    pub enable_file_integrity_checks: bool,

    pub images_path: String,

    pub max_file_size_gb: u64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            allowed_base_paths: vec![],
            jellyfin_root: "./library".to_string(),
            movie_naming_format: "Movies/{Title} ({Year})/{Title} ({Year}) - {Version}".to_string(),
            episode_naming_format:
                "Shows/{Series Title} ({Year})/Season {Season:02}/{Series Title} S{Season:02}E{Episode:02}"
                    .to_string(),
            recycle_path: "./recycle".to_string(),
            recycle_cleanup_days: 7,
            use_trash_for_deletes: true,
            enable_file_integrity_checks: false,
            images_path: "images".to_string(),
            max_file_size_gb: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub max_scan_depth: usize,

    pub max_concurrent_scans: usize,

    /// Permits for background tasks (default: 4)
    pub scan_worker_threads: usize,

    pub scan_timeout_minutes: u64,

    /// Persist scan results unless the request says otherwise
    pub persist_results: bool,

    pub video_extensions: Vec<String>,

    pub audio_extensions: Vec<String>,

    pub subtitle_extensions: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        let owned = |exts: &[&str]| exts.iter().map(|e| (*e).to_string()).collect();
        Self {
            max_scan_depth: 10,
            max_concurrent_scans: 2,
            scan_worker_threads: 4,
            scan_timeout_minutes: 60,
            persist_results: true,
            video_extensions: owned(constants::VIDEO_EXTENSIONS),
            audio_extensions: owned(constants::AUDIO_EXTENSIONS),
            subtitle_extensions: owned(constants::SUBTITLE_EXTENSIONS),
        }
    }
}

impl ScannerConfig {
    #[must_use]
    pub fn is_video(&self, path: &Path) -> bool {
        has_extension(path, &self.video_extensions)
    }

    #[must_use]
    pub fn is_media(&self, path: &Path) -> bool {
        has_extension(path, &self.video_extensions)
            || has_extension(path, &self.audio_extensions)
            || has_extension(path, &self.subtitle_extensions)
    }

    #[must_use]
    pub fn all_extensions(&self) -> Vec<String> {
        self.video_extensions
            .iter()
            .chain(&self.audio_extensions)
            .chain(&self.subtitle_extensions)
            .cloned()
            .collect()
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let dotted = format!(".{}", ext.to_lowercase());
            extensions.iter().any(|e| e.eq_ignore_ascii_case(&dotted))
        })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffprobe_path: String,

    pub ffmpeg_path: String,

    /// Seconds before an ffprobe/ffmpeg invocation is abandoned
    pub metadata_extraction_timeout: u64,

    pub temp_directory: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            metadata_extraction_timeout: 30,
            temp_directory: std::env::temp_dir()
                .join("media-catalog")
                .to_string_lossy()
                .into_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OmdbConfig {
    pub base_url: String,

    pub api_key: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,

    /// Save the poster of a newly added movie into `library.images_path`
    pub download_posters: bool,
}

impl Default for OmdbConfig {
    fn default() -> Self {
        Self {
            base_url: constants::OMDB_BASE_URL.to_string(),
            api_key: String::new(),
            request_timeout_seconds: 30,
            download_posters: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.apply_env_overrides();
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// `MEDIA_CATALOG_*` variables win over file values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(format!("{}{key}", constants::ENV_PREFIX)).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("OMDB_API_KEY") {
            self.omdb.api_key = key;
        }
        if let Some(db) = lookup("DATABASE_PATH") {
            self.general.database_path = db;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.general.log_level = level;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(paths) = lookup("ALLOWED_BASE_PATHS") {
            self.library.allowed_base_paths = paths
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_config_path();
        self.save_to_path(&path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("media-catalog").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".media-catalog").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.scanner.max_concurrent_scans == 0 {
            anyhow::bail!("scanner.max_concurrent_scans must be > 0");
        }

        if self.scanner.scan_worker_threads == 0 {
            anyhow::bail!("scanner.scan_worker_threads must be > 0");
        }

        if self.scanner.video_extensions.is_empty() {
            anyhow::bail!("scanner.video_extensions cannot be empty");
        }

        url::Url::parse(&self.omdb.base_url)
            .with_context(|| format!("Invalid OMDB base URL: {}", self.omdb.base_url))?;

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("general.min_db_connections cannot exceed max_db_connections");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8082);
        assert_eq!(config.scanner.max_scan_depth, 10);
        assert_eq!(config.scanner.max_concurrent_scans, 2);
        assert!(config.library.use_trash_for_deletes);
        assert!(!config.library.enable_file_integrity_checks);
        assert_eq!(config.tools.metadata_extraction_timeout, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[scanner]"));
        assert!(toml_str.contains("[omdb]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [scanner]
            max_scan_depth = 3
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.scanner.max_scan_depth, 3);

        assert_eq!(config.omdb.base_url, constants::OMDB_BASE_URL);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides_from(|key| match key {
            "OMDB_API_KEY" => Some("abc123".to_string()),
            "PORT" => Some("9000".to_string()),
            "ALLOWED_BASE_PATHS" => Some("/media, /srv/media ,".to_string()),
            _ => None,
        });

        assert_eq!(config.omdb.api_key, "abc123");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.library.allowed_base_paths, vec!["/media", "/srv/media"]);
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides_from(|key| (key == "PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.server.port, 8082);
    }

    #[test]
    fn test_extension_matching() {
        let scanner = ScannerConfig::default();
        assert!(scanner.is_video(Path::new("/m/Film (2010).MKV")));
        assert!(scanner.is_media(Path::new("/m/track.flac")));
        assert!(scanner.is_media(Path::new("/m/Film.en.srt")));
        assert!(!scanner.is_media(Path::new("/m/cover.jpg")));
        assert!(!scanner.is_video(Path::new("/m/noext")));
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.omdb.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
