use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormatInfo {
    pub format_name: Option<String>,
    pub format_long_name: Option<String>,
    pub nb_streams: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoStream {
    pub codec: Option<String>,
    pub codec_long: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    /// "WxH"
    pub resolution: Option<String>,
    pub aspect_ratio: Option<String>,
    pub frame_rate: f64,
    pub pixel_format: Option<String>,
    pub bitrate: Option<i64>,
    pub profile: Option<String>,
    pub level: Option<String>,
    pub color_space: Option<String>,
    pub color_range: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudioStream {
    pub index: i64,
    pub codec: Option<String>,
    pub codec_long: Option<String>,
    pub channels: Option<i64>,
    pub channel_layout: Option<String>,
    pub sample_rate: Option<i64>,
    pub bitrate: Option<i64>,
    pub language: String,
    pub title: Option<String>,
    pub default: bool,
    pub is_sdh: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleStream {
    pub index: i64,
    pub codec: Option<String>,
    pub codec_long: Option<String>,
    pub language: String,
    pub title: Option<String>,
    pub default: bool,
    pub forced: bool,
    pub is_sdh: bool,
    pub is_external: bool,
}

/// Everything ffprobe tells us about one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaMetadata {
    pub format: FormatInfo,
    pub duration: Option<f64>,
    pub size: Option<i64>,
    pub bitrate: Option<i64>,
    pub video: Option<VideoStream>,
    pub audio: Vec<AudioStream>,
    pub subtitle: Vec<SubtitleStream>,
    pub resolution_category: Option<String>,
}

/// Title, year and episode markers recovered from a file name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInfo {
    pub title: String,
    pub year: Option<i32>,
    pub season: Option<i32>,
    pub episode: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub id: String,
    pub user_id: Option<String>,
    pub library_path: String,
    pub file_path: String,
    pub file_name: String,
    pub file_extension: String,
    pub file_size: i64,
    pub media_type: Option<String>,
    pub scan_id: Option<String>,
    pub status: String,
    pub container_format: Option<String>,
    pub duration: Option<f64>,
    pub overall_bitrate: Option<i64>,
    pub video: Option<VideoStream>,
    pub audio_tracks: Vec<AudioStream>,
    pub subtitle_tracks: Vec<SubtitleStream>,
    pub checksum: Option<String>,
    pub is_assigned: bool,
    pub assignment_id: Option<String>,
    pub media_id: Option<String>,
    pub parsed_info: Option<ParsedInfo>,
    pub file_metadata: Option<serde_json::Value>,
    pub date_added: String,
    pub date_modified: Option<String>,
    pub date_created: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MediaFileInput {
    pub user_id: Option<String>,
    pub library_path: String,
    pub file_path: String,
    pub file_name: String,
    pub file_extension: String,
    pub file_size: i64,
    pub media_type: Option<String>,
    pub scan_id: Option<String>,
    pub status: String,
    pub metadata: Option<MediaMetadata>,
    pub checksum: Option<String>,
    pub parsed_info: Option<ParsedInfo>,
    pub file_metadata: Option<serde_json::Value>,
    pub date_modified: Option<String>,
    pub date_created: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDirectory {
    pub id: String,
    pub library_path: String,
    pub path: String,
    pub name: String,
    pub media_type: String,
    pub scan_id: Option<String>,
    pub status: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryPath {
    pub id: String,
    pub path: String,
    pub name: Option<String>,
    pub last_scanned: Option<String>,
    pub last_scan_id: Option<String>,
    pub last_scan_status: Option<String>,
    pub created_at: String,
}

/// Filesystem facts about a path.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub path: String,
    pub name: String,
    pub extension: String,
    pub size: u64,
    pub size_mb: f64,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub accessed: Option<String>,
    pub permissions: String,
    pub is_directory: bool,
    pub is_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}
