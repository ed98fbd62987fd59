use crate::models::media::ParsedInfo;
use regex::Regex;
use std::sync::OnceLock;

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"\((\d{4})\)")
}

fn episode_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"(?i)S(\d+)E(\d+)")
}

/// Recovers title, year and SxxEyy markers from a file stem.
///
/// The title is the text before the `(YYYY)` marker, otherwise before the
/// episode marker, otherwise the whole stem.
#[must_use]
pub fn parse_media_filename(stem: &str) -> ParsedInfo {
    let year_match = year_regex().captures(stem);
    let episode_match = episode_regex().captures(stem);

    let year = year_match
        .as_ref()
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok());

    let (season, episode) = episode_match.as_ref().map_or((None, None), |c| {
        (
            c.get(1).and_then(|m| m.as_str().parse().ok()),
            c.get(2).and_then(|m| m.as_str().parse().ok()),
        )
    });

    let cut = year_match
        .as_ref()
        .and_then(|c| c.get(0))
        .or_else(|| episode_match.as_ref().and_then(|c| c.get(0)))
        .map(|m| m.start());

    let title = cut
        .map(|end| clean_title(&stem[..end]))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| stem.trim().to_string());

    ParsedInfo {
        title,
        year,
        season,
        episode,
    }
}

fn clean_title(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(['-', '.', '_'])
        .trim()
        .to_string()
}

/// `episode` for `SxxEyy` names, `movie` for names carrying `(YYYY)`.
#[must_use]
pub fn classify_file(name: &str) -> &'static str {
    if episode_regex().is_match(name) {
        "episode"
    } else if year_regex().is_match(name) {
        "movie"
    } else {
        "unknown"
    }
}

/// Season folders first, then `Name (...)` folders: a movie when a video
/// sits directly inside, otherwise a series.
#[must_use]
pub fn classify_directory(name: &str, has_video_child: bool) -> &'static str {
    if name.to_lowercase().starts_with("season") {
        return "season";
    }

    if name.contains('(') && name.contains(')') {
        return if has_video_child { "movie" } else { "series" };
    }

    "unknown"
}
