pub const VIDEO_EXTENSIONS: &[&str] = &[
    ".mp4", ".mkv", ".avi", ".mov", ".wmv", ".m4v", ".flv", ".webm",
];

pub const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".flac", ".wav", ".aac", ".ogg"];

pub const SUBTITLE_EXTENSIONS: &[&str] = &[".srt", ".vtt", ".ass", ".ssa", ".sub", ".idx"];

pub const OMDB_BASE_URL: &str = "http://www.omdbapi.com/";

pub const ENV_PREFIX: &str = "MEDIA_CATALOG_";

pub mod scan {
    /// Directory names never descended into.
    pub const SKIPPED_DIRS: &[&str] = &["@eaDir"];

    pub const PROGRESS_LOG_EVERY: usize = 100;

    pub const WALK_CHANNEL_CAPACITY: usize = 100;
}

pub mod files {
    pub const CHECKSUM_CHUNK_SIZE: usize = 8192;

    /// Characters rejected in user supplied file names.
    pub const INVALID_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*', '\0'];
}

pub mod limits {
    pub const DEFAULT_PAGE_SIZE: u64 = 100;

    pub const MAX_PAGE_SIZE: u64 = 1000;

    pub const MAX_SEARCH_RESULTS: usize = 10;
}

pub mod media {
    pub const DEFAULT_VERSION: &str = "1080p";

    pub const DEFAULT_THUMBNAIL_SECONDS: f64 = 30.0;

    pub const MIN_THUMBNAIL_SECONDS: f64 = 10.0;

    pub const MAX_THUMBNAIL_SECONDS: f64 = 300.0;
}
