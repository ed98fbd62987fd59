//! ffprobe/ffmpeg backed extraction of stream metadata and thumbnails.

use crate::config::{ScannerConfig, ToolsConfig};
use crate::models::media::{AudioStream, FormatInfo, MediaMetadata, SubtitleStream, VideoStream};
use crate::services::error::LibraryError;
use crate::services::media_info;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const BATCH_CONCURRENCY: usize = 4;

#[derive(Clone)]
pub struct MetadataExtractor {
    tools: ToolsConfig,
    scanner: ScannerConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub path: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MediaMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchExtraction {
    pub results: Vec<BatchItem>,
    pub summary: BatchSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportedFormats {
    pub video: Vec<String>,
    pub audio: Vec<String>,
    pub subtitle: Vec<String>,
}

impl MetadataExtractor {
    #[must_use]
    pub const fn new(tools: ToolsConfig, scanner: ScannerConfig) -> Self {
        Self { tools, scanner }
    }

    pub async fn extract_video_metadata(&self, path: &Path) -> Result<MediaMetadata, LibraryError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(LibraryError::NotFound(path.display().to_string()));
        }

        let start = Instant::now();
        let config = ffprobe::Config::builder()
            .ffprobe_bin(&self.tools.ffprobe_path)
            .build();
        let target = path.to_path_buf();
        let timeout = Duration::from_secs(self.tools.metadata_extraction_timeout);

        let probe = tokio::time::timeout(
            timeout,
            tokio::task::spawn_blocking(move || ffprobe::ffprobe_config(config, target)),
        )
        .await
        .map_err(|_| {
            LibraryError::MetadataExtraction(format!(
                "ffprobe timed out after {}s for {}",
                timeout.as_secs(),
                path.display()
            ))
        })??
        .map_err(|e| {
            LibraryError::MetadataExtraction(format!("ffprobe failed on {}: {e}", path.display()))
        })?;

        let raw = serde_json::to_value(&probe)
            .map_err(|e| LibraryError::MetadataExtraction(e.to_string()))?;
        let metadata = parse_probe_output(raw)?;

        debug!(
            path = %path.display(),
            duration_ms = start.elapsed().as_millis(),
            resolution = ?metadata.resolution_category,
            "Extracted media metadata"
        );

        Ok(metadata)
    }

    /// Grabs one frame at `timestamp` seconds into `{temp_directory}/thumb_{stem}.jpg`.
    pub async fn get_video_thumbnail(
        &self,
        path: &Path,
        timestamp: f64,
    ) -> Result<PathBuf, LibraryError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(LibraryError::NotFound(path.display().to_string()));
        }

        let temp_dir = PathBuf::from(&self.tools.temp_directory);
        tokio::fs::create_dir_all(&temp_dir).await?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "thumbnail".to_string());
        let output_path = temp_dir.join(format!("thumb_{stem}.jpg"));

        let run = tokio::process::Command::new(&self.tools.ffmpeg_path)
            .arg("-y")
            .arg("-ss")
            .arg(format!("{timestamp:.3}"))
            .arg("-i")
            .arg(path)
            .args(["-vframes", "1", "-f", "image2", "-vcodec", "mjpeg"])
            .arg(&output_path)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(
            Duration::from_secs(self.tools.metadata_extraction_timeout),
            run,
        )
        .await
        .map_err(|_| LibraryError::MetadataExtraction("ffmpeg timed out".to_string()))?
        .map_err(|e| LibraryError::MetadataExtraction(format!("Failed to run ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LibraryError::MetadataExtraction(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.lines().last().unwrap_or_default()
            )));
        }

        Ok(output_path)
    }

    pub async fn batch_extract(&self, paths: Vec<String>) -> BatchExtraction {
        let total = paths.len();
        info!(total, "Starting batch metadata extraction");

        let results: Vec<BatchItem> = stream::iter(paths)
            .map(|path| async move {
                match self.extract_video_metadata(Path::new(&path)).await {
                    Ok(metadata) => BatchItem {
                        path,
                        success: true,
                        metadata: Some(metadata),
                        error: None,
                    },
                    Err(e) => {
                        warn!(path = %path, error = %e, "Metadata extraction failed");
                        BatchItem {
                            path,
                            success: false,
                            metadata: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .buffer_unordered(BATCH_CONCURRENCY)
            .collect()
            .await;

        let successful = results.iter().filter(|r| r.success).count();
        BatchExtraction {
            summary: BatchSummary {
                total,
                successful,
                failed: total - successful,
            },
            results,
        }
    }

    #[must_use]
    pub fn supported_formats(&self) -> SupportedFormats {
        SupportedFormats {
            video: self.scanner.video_extensions.clone(),
            audio: self.scanner.audio_extensions.clone(),
            subtitle: self.scanner.subtitle_extensions.clone(),
        }
    }
}

// ============================================================================
// Probe output
// ============================================================================

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: ProbeFormat,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeFormat {
    format_name: Option<String>,
    format_long_name: Option<String>,
    nb_streams: Option<i64>,
    duration: Option<String>,
    size: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    index: i64,
    codec_type: Option<String>,
    codec_name: Option<String>,
    codec_long_name: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
    display_aspect_ratio: Option<String>,
    r_frame_rate: Option<String>,
    pix_fmt: Option<String>,
    bit_rate: Option<String>,
    profile: Option<String>,
    level: Option<i64>,
    color_space: Option<String>,
    color_range: Option<String>,
    channels: Option<i64>,
    channel_layout: Option<String>,
    sample_rate: Option<String>,
    #[serde(default)]
    disposition: ProbeDisposition,
    #[serde(default)]
    tags: Option<ProbeTags>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeDisposition {
    #[serde(default)]
    default: i64,
    #[serde(default)]
    forced: i64,
    #[serde(default)]
    hearing_impaired: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeTags {
    language: Option<String>,
    title: Option<String>,
}

fn parse_num<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Maps ffprobe's JSON document into [`MediaMetadata`].
pub fn parse_probe_output(raw: serde_json::Value) -> Result<MediaMetadata, LibraryError> {
    let output: ProbeOutput = serde_json::from_value(raw)
        .map_err(|e| LibraryError::MetadataExtraction(format!("Unexpected ffprobe output: {e}")))?;

    let mut metadata = MediaMetadata {
        format: FormatInfo {
            format_name: output.format.format_name,
            format_long_name: output.format.format_long_name,
            nb_streams: output.format.nb_streams,
        },
        duration: parse_num(output.format.duration.as_deref()),
        size: parse_num(output.format.size.as_deref()),
        bitrate: parse_num(output.format.bit_rate.as_deref()),
        ..Default::default()
    };

    for stream in output.streams {
        let tags = stream.tags.unwrap_or_default();
        match stream.codec_type.as_deref() {
            Some("video") if metadata.video.is_none() => {
                let resolution = match (stream.width, stream.height) {
                    (Some(w), Some(h)) => Some(format!("{w}x{h}")),
                    _ => None,
                };
                metadata.resolution_category = media_info::resolution_category(stream.height);
                metadata.video = Some(VideoStream {
                    codec: stream.codec_name,
                    codec_long: stream.codec_long_name,
                    width: stream.width,
                    height: stream.height,
                    resolution,
                    aspect_ratio: stream.display_aspect_ratio,
                    frame_rate: stream
                        .r_frame_rate
                        .as_deref()
                        .map_or(0.0, media_info::parse_frame_rate),
                    pixel_format: stream.pix_fmt,
                    bitrate: parse_num(stream.bit_rate.as_deref()),
                    profile: stream.profile,
                    level: stream.level.map(|l| l.to_string()),
                    color_space: stream.color_space,
                    color_range: stream.color_range,
                });
            }
            Some("audio") => metadata.audio.push(AudioStream {
                index: stream.index,
                codec: stream.codec_name,
                codec_long: stream.codec_long_name,
                channels: stream.channels,
                channel_layout: stream.channel_layout,
                sample_rate: parse_num(stream.sample_rate.as_deref()),
                bitrate: parse_num(stream.bit_rate.as_deref()),
                is_sdh: media_info::is_sdh_title(tags.title.as_deref()),
                language: tags.language.unwrap_or_else(|| "unknown".to_string()),
                title: tags.title,
                default: stream.disposition.default == 1,
            }),
            Some("subtitle") => metadata.subtitle.push(SubtitleStream {
                index: stream.index,
                codec: stream.codec_name,
                codec_long: stream.codec_long_name,
                is_sdh: stream.disposition.hearing_impaired == 1
                    || media_info::is_sdh_title(tags.title.as_deref()),
                language: tags.language.unwrap_or_else(|| "unknown".to_string()),
                title: tags.title,
                default: stream.disposition.default == 1,
                forced: stream.disposition.forced == 1,
                is_external: false,
            }),
            _ => {}
        }
    }

    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_probe() -> serde_json::Value {
        json!({
            "format": {
                "filename": "/m/Inception (2010).mkv",
                "nb_streams": 3,
                "format_name": "matroska,webm",
                "format_long_name": "Matroska / WebM",
                "duration": "8880.123000",
                "size": "4500000000",
                "bit_rate": "4054000"
            },
            "streams": [
                {
                    "index": 0,
                    "codec_type": "video",
                    "codec_name": "h264",
                    "codec_long_name": "H.264 / AVC",
                    "width": 1920,
                    "height": 1080,
                    "display_aspect_ratio": "16:9",
                    "r_frame_rate": "24000/1001",
                    "pix_fmt": "yuv420p",
                    "profile": "High",
                    "level": 41,
                    "disposition": {"default": 1, "forced": 0}
                },
                {
                    "index": 1,
                    "codec_type": "audio",
                    "codec_name": "ac3",
                    "channels": 6,
                    "channel_layout": "5.1(side)",
                    "sample_rate": "48000",
                    "bit_rate": "640000",
                    "disposition": {"default": 1},
                    "tags": {"language": "eng"}
                },
                {
                    "index": 2,
                    "codec_type": "subtitle",
                    "codec_name": "subrip",
                    "disposition": {"default": 0, "forced": 1},
                    "tags": {"language": "eng", "title": "English SDH"}
                }
            ]
        })
    }

    #[test]
    fn test_parse_probe_output() {
        let metadata = parse_probe_output(sample_probe()).unwrap();

        assert_eq!(metadata.format.format_name.as_deref(), Some("matroska,webm"));
        assert_eq!(metadata.size, Some(4_500_000_000));
        assert_eq!(metadata.bitrate, Some(4_054_000));
        assert_eq!(metadata.resolution_category.as_deref(), Some("1080p"));

        let video = metadata.video.unwrap();
        assert_eq!(video.resolution.as_deref(), Some("1920x1080"));
        assert_eq!(video.level.as_deref(), Some("41"));
        assert!((video.frame_rate - 23.976).abs() < 0.001);

        assert_eq!(metadata.audio.len(), 1);
        assert_eq!(metadata.audio[0].channels, Some(6));
        assert_eq!(metadata.audio[0].sample_rate, Some(48000));
        assert!(metadata.audio[0].default);

        assert_eq!(metadata.subtitle.len(), 1);
        assert!(metadata.subtitle[0].forced);
        assert!(metadata.subtitle[0].is_sdh);
    }

    #[test]
    fn test_missing_language_defaults_to_unknown() {
        let raw = json!({
            "format": {},
            "streams": [{"index": 1, "codec_type": "audio", "codec_name": "aac"}]
        });
        let metadata = parse_probe_output(raw).unwrap();
        assert_eq!(metadata.audio[0].language, "unknown");
        assert!(metadata.video.is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let extractor = MetadataExtractor::new(ToolsConfig::default(), ScannerConfig::default());
        let err = extractor
            .extract_video_metadata(Path::new("/definitely/missing.mkv"))
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::NotFound(_)));
    }
}
