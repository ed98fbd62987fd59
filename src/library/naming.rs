use crate::config::LibraryConfig;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Builds Jellyfin-style destination paths from the configured naming formats.
pub struct JellyfinLayout {
    config: LibraryConfig,
}

#[derive(Debug, Clone, Default)]
pub struct NamingOptions {
    /// Movie title, or series title for episodes
    pub title: String,
    pub year: Option<String>,
    pub version: Option<String>,
    pub season: Option<i32>,
    pub episode: Option<i32>,
    pub episode_title: Option<String>,
    pub extension: String,
}

impl JellyfinLayout {
    #[must_use]
    pub const fn new(config: LibraryConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        Path::new(&self.config.jellyfin_root)
    }

    #[must_use]
    pub fn movie_path(&self, options: &NamingOptions) -> PathBuf {
        let relative = format_path(&self.config.movie_naming_format, options);
        self.root().join(with_extension(relative, &options.extension))
    }

    #[must_use]
    pub fn episode_path(&self, options: &NamingOptions) -> PathBuf {
        let relative = format_path(&self.config.episode_naming_format, options);
        self.root().join(with_extension(relative, &options.extension))
    }
}

/// Appends the extension; titles may contain dots, so nothing is replaced.
fn with_extension(relative: String, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        relative
    } else {
        format!("{relative}.{extension}")
    }
}

#[must_use]
pub fn format_path(format: &str, options: &NamingOptions) -> String {
    let season = options.season.unwrap_or(1);
    let episode = options.episode.unwrap_or(1);

    let safe_title = sanitize_filename(&options.title);
    let safe_episode_title = options
        .episode_title
        .as_deref()
        .map(sanitize_filename)
        .unwrap_or_default();
    let safe_version = options
        .version
        .as_deref()
        .map(sanitize_filename)
        .unwrap_or_default();
    let year = options.year.as_deref().map(year_prefix).unwrap_or_default();

    let path_str = format
        .replace("{Series Title}", &safe_title)
        .replace("{Title}", &safe_title)
        .replace("{Season:02}", &format!("{season:02}"))
        .replace("{Episode:02}", &format!("{episode:02}"))
        .replace("{Season}", &season.to_string())
        .replace("{Episode}", &episode.to_string())
        .replace("{Episode Title}", &safe_episode_title)
        .replace("{Version}", &safe_version)
        .replace("{Year}", &year);

    path_str
        .split('/')
        .map(cleanup_segment)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// "2008–2013" style ranges keep their first year.
fn year_prefix(year: &str) -> String {
    year.chars().take_while(char::is_ascii_digit).collect()
}

fn cleanup_segment(segment: &str) -> String {
    let mut p = segment.to_string();
    let mut prev_len = 0;

    while p.len() != prev_len {
        prev_len = p.len();
        p = p
            .replace("[]", "")
            .replace("()", "")
            .replace("  ", " ")
            .replace(" - - ", " - ")
            .replace(" .", ".");
    }

    let p = p.trim();
    let p = p.trim_end_matches(" -");
    let p = p.trim_end_matches('-');
    let p = p.trim_start_matches("- ");

    p.trim().to_string()
}

#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn named_folder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^.+ \(\d{4}\)$").expect("Invalid regex pattern defined in code"))
}

fn season_folder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?i:season) \d{2,}$").expect("Invalid regex pattern defined in code")
    })
}

/// `Name (YYYY)` folders and zero-padded `Season NN` folders.
#[must_use]
pub fn is_jellyfin_folder_name(name: &str) -> bool {
    named_folder_regex().is_match(name) || season_folder_regex().is_match(name)
}

#[must_use]
pub fn is_season_folder_name(name: &str) -> bool {
    season_folder_regex().is_match(name)
}

/// Splits `Name (YYYY)` into its title and year.
#[must_use]
pub fn split_title_year(name: &str) -> Option<(String, String)> {
    if !named_folder_regex().is_match(name) {
        return None;
    }
    let open = name.rfind(" (")?;
    let title = name[..open].trim().to_string();
    let year = name[open + 2..name.len() - 1].to_string();
    Some((title, year))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> LibraryConfig {
        LibraryConfig {
            jellyfin_root: "/media".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_movie_path() {
        let layout = JellyfinLayout::new(test_config());
        let path = layout.movie_path(&NamingOptions {
            title: "Inception".to_string(),
            year: Some("2010".to_string()),
            version: Some("1080p".to_string()),
            extension: "mkv".to_string(),
            ..Default::default()
        });

        assert_eq!(
            path,
            PathBuf::from("/media/Movies/Inception (2010)/Inception (2010) - 1080p.mkv")
        );
    }

    #[test]
    fn test_movie_path_without_version_or_year() {
        let layout = JellyfinLayout::new(test_config());
        let path = layout.movie_path(&NamingOptions {
            title: "Primer".to_string(),
            extension: "mp4".to_string(),
            ..Default::default()
        });

        assert_eq!(path, PathBuf::from("/media/Movies/Primer/Primer.mp4"));
    }

    #[test]
    fn test_episode_path() {
        let layout = JellyfinLayout::new(test_config());
        let path = layout.episode_path(&NamingOptions {
            title: "The Wire".to_string(),
            year: Some("2002–2008".to_string()),
            season: Some(1),
            episode: Some(3),
            extension: "mkv".to_string(),
            ..Default::default()
        });

        assert_eq!(
            path,
            PathBuf::from("/media/Shows/The Wire (2002)/Season 01/The Wire S01E03.mkv")
        );
    }

    #[test]
    fn test_dotted_title_keeps_full_name() {
        let layout = JellyfinLayout::new(test_config());
        let path = layout.movie_path(&NamingOptions {
            title: "Dr. Strangelove".to_string(),
            year: Some("1964".to_string()),
            extension: ".mkv".to_string(),
            ..Default::default()
        });

        assert_eq!(
            path,
            PathBuf::from("/media/Movies/Dr. Strangelove (1964)/Dr. Strangelove (1964).mkv")
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Mission: Impossible"), "Mission Impossible");
        assert_eq!(sanitize_filename("AC/DC  Live"), "AC DC Live");
    }

    #[test]
    fn test_folder_names() {
        assert!(is_jellyfin_folder_name("Inception (2010)"));
        assert!(is_jellyfin_folder_name("Season 01"));
        assert!(!is_jellyfin_folder_name("Season 1"));
        assert!(!is_jellyfin_folder_name("inception.2010.1080p"));
        assert_eq!(
            split_title_year("Inception (2010)"),
            Some(("Inception".to_string(), "2010".to_string()))
        );
    }
}
