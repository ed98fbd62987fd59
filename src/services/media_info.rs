//! Facts derived from probe output and file names: resolution buckets,
//! subtitle languages, SDH markers and thumbnail timing.

use crate::constants::media::{
    DEFAULT_THUMBNAIL_SECONDS, MAX_THUMBNAIL_SECONDS, MIN_THUMBNAIL_SECONDS,
};
use crate::models::media::SubtitleStream;
use std::path::Path;

const LANGUAGE_MARKERS: &[(&[&str], &str)] = &[
    (&["en", "eng", "english"], "eng"),
    (&["es", "spa", "spanish"], "spa"),
    (&["fr", "fra", "french"], "fra"),
    (&["de", "ger", "german"], "deu"),
    (&["it", "ita", "italian"], "ita"),
    (&["ja", "jpn", "japanese"], "jpn"),
    (&["zh", "chi", "chinese"], "chi"),
    (&["pt", "por", "portuguese"], "por"),
    (&["ru", "rus", "russian"], "rus"),
    (&["ko", "kor", "korean"], "kor"),
];

#[must_use]
pub fn resolution_category(height: Option<i64>) -> Option<String> {
    let h = height?;
    let label = match h {
        ..=480 => "480p".to_string(),
        481..=576 => "576p".to_string(),
        577..=720 => "720p".to_string(),
        721..=1080 => "1080p".to_string(),
        1081..=1440 => "1440p".to_string(),
        1441..=2160 => "4K".to_string(),
        2161..=4320 => "8K".to_string(),
        _ => format!("{h}p"),
    };
    Some(label)
}

/// Parses "24000/1001" style rates as well as plain floats.
#[must_use]
pub fn parse_frame_rate(raw: &str) -> f64 {
    if let Some((num, den)) = raw.split_once('/') {
        return match (num.trim().parse::<f64>(), den.trim().parse::<f64>()) {
            (Ok(n), Ok(d)) if d != 0.0 => n / d,
            _ => 0.0,
        };
    }
    raw.trim().parse::<f64>().unwrap_or(0.0)
}

/// ISO 639-2 code from a `.code.` or `_code_` marker in the file name.
#[must_use]
pub fn detect_language(file_name: &str) -> String {
    let lower = file_name.to_lowercase();
    for (markers, code) in LANGUAGE_MARKERS {
        for marker in *markers {
            if lower.contains(&format!(".{marker}.")) || lower.contains(&format!("_{marker}_")) {
                return (*code).to_string();
            }
        }
    }
    "und".to_string()
}

#[must_use]
pub fn is_sdh_title(title: Option<&str>) -> bool {
    title.is_some_and(|t| {
        let t = t.to_lowercase();
        t.contains("sdh") || t.contains("hearing impaired") || t.contains("cc")
    })
}

/// Metadata for a sidecar subtitle file, inferred from its name.
#[must_use]
pub fn external_subtitle(path: &Path) -> SubtitleStream {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let lower = name.to_lowercase();
    let format = path
        .extension()
        .map(|e| e.to_string_lossy().to_uppercase());

    SubtitleStream {
        index: 0,
        codec: format,
        codec_long: None,
        language: detect_language(&name),
        title: Some(name.clone()),
        default: false,
        forced: lower.contains("forced"),
        is_sdh: lower.contains("sdh") || lower.contains("cc"),
        is_external: true,
    }
}

/// A fifth of the way in, clamped so thumbnails skip intros without
/// landing past short clips.
#[must_use]
pub fn thumbnail_timestamp(duration: Option<f64>) -> f64 {
    match duration {
        Some(d) if d > 0.0 => (d * 0.2).clamp(MIN_THUMBNAIL_SECONDS, MAX_THUMBNAIL_SECONDS),
        _ => DEFAULT_THUMBNAIL_SECONDS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_category() {
        assert_eq!(resolution_category(Some(480)).as_deref(), Some("480p"));
        assert_eq!(resolution_category(Some(576)).as_deref(), Some("576p"));
        assert_eq!(resolution_category(Some(800)).as_deref(), Some("1080p"));
        assert_eq!(resolution_category(Some(2160)).as_deref(), Some("4K"));
        assert_eq!(resolution_category(Some(4320)).as_deref(), Some("8K"));
        assert_eq!(resolution_category(Some(5000)).as_deref(), Some("5000p"));
        assert_eq!(resolution_category(None), None);
    }

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("24000/1001") - 23.976_023_976).abs() < 1e-6);
        assert!((parse_frame_rate("25") - 25.0).abs() < f64::EPSILON);
        assert!((parse_frame_rate("0/0") - 0.0).abs() < f64::EPSILON);
        assert!((parse_frame_rate("garbage") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language("Movie (2010).en.srt"), "eng");
        assert_eq!(detect_language("Movie_german_.srt"), "deu");
        assert_eq!(detect_language("Movie.KOR.forced.srt"), "kor");
        assert_eq!(detect_language("Movie.srt"), "und");
    }

    #[test]
    fn test_external_subtitle_flags() {
        let sub = external_subtitle(Path::new("/m/Movie.eng.sdh.srt"));
        assert_eq!(sub.codec.as_deref(), Some("SRT"));
        assert_eq!(sub.language, "eng");
        assert!(sub.is_sdh);
        assert!(!sub.forced);
        assert!(sub.is_external);

        let sub = external_subtitle(Path::new("/m/Movie.fr.forced.ass"));
        assert!(sub.forced);
        assert_eq!(sub.language, "fra");
    }

    #[test]
    fn test_sdh_titles() {
        assert!(is_sdh_title(Some("English (SDH)")));
        assert!(is_sdh_title(Some("Hearing Impaired")));
        assert!(!is_sdh_title(Some("Commentary")));
        assert!(!is_sdh_title(None));
    }

    #[test]
    fn test_thumbnail_timestamp_is_clamped() {
        assert!((thumbnail_timestamp(None) - 30.0).abs() < f64::EPSILON);
        assert!((thumbnail_timestamp(Some(20.0)) - 10.0).abs() < f64::EPSILON);
        assert!((thumbnail_timestamp(Some(600.0)) - 120.0).abs() < f64::EPSILON);
        assert!((thumbnail_timestamp(Some(7200.0)) - 300.0).abs() < f64::EPSILON);
    }
}
