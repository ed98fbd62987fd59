use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rating {
    pub source: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSummary {
    pub total_files: i64,
    pub versions: Vec<String>,
    pub has_physical_copy: bool,
    pub total_file_size: i64,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub year: Option<String>,
    pub rated: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<String>,
    pub plot: Option<String>,
    pub directors: Vec<String>,
    pub writers: Vec<String>,
    pub cast: Vec<String>,
    pub genres: Vec<String>,
    pub languages: Vec<String>,
    pub countries: Vec<String>,
    pub ratings: Vec<Rating>,
    pub links: Vec<String>,
    pub image_files: Vec<String>,
    pub omdb_data: Option<serde_json::Value>,
    pub imdb_id: Option<String>,
    pub assignment_summary: Option<AssignmentSummary>,
    pub created_at: String,
    pub updated_at: String,
}

/// Field values of a movie about to be stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MovieInput {
    pub title: String,
    pub year: Option<String>,
    pub rated: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<String>,
    pub plot: Option<String>,
    pub directors: Vec<String>,
    pub writers: Vec<String>,
    pub cast: Vec<String>,
    pub genres: Vec<String>,
    pub languages: Vec<String>,
    pub countries: Vec<String>,
    pub ratings: Vec<Rating>,
    pub links: Vec<String>,
    pub image_files: Vec<String>,
    pub omdb_data: Option<serde_json::Value>,
    pub imdb_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PersonRole {
    Director,
    Actor,
}

impl PersonRole {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Director => "director",
            Self::Actor => "actor",
        }
    }
}

impl fmt::Display for PersonRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "director" | "directors" => Ok(Self::Director),
            "actor" | "actors" | "cast" => Ok(Self::Actor),
            other => Err(format!("Unknown person role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub role: PersonRole,
    pub full_name: String,
    pub birthplace: Option<String>,
    pub birthday: Option<String>,
    pub notes: Option<String>,
    pub movie_ids: Vec<String>,
    pub series_ids: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonInput {
    pub role: PersonRole,
    pub full_name: String,
    #[serde(default)]
    pub birthplace: Option<String>,
    #[serde(default)]
    pub birthday: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub movie_ids: Vec<String>,
    #[serde(default)]
    pub series_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseMediaType {
    Movie,
    Series,
    Season,
    Episode,
}

impl ReleaseMediaType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
            Self::Season => "season",
            Self::Episode => "episode",
        }
    }
}

impl FromStr for ReleaseMediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Self::Movie),
            "series" => Ok(Self::Series),
            "season" => Ok(Self::Season),
            "episode" => Ok(Self::Episode),
            other => Err(format!("Unknown release media type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    pub media_type: ReleaseMediaType,
    pub disc_ids: Vec<String>,
    pub extras: Vec<String>,
    pub episode_ids: Vec<String>,
    pub movie_ids: Vec<String>,
    pub season_ids: Vec<String>,
    pub series_ids: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseInput {
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    pub media_type: ReleaseMediaType,
    #[serde(default)]
    pub disc_ids: Vec<String>,
    #[serde(default)]
    pub extras: Vec<String>,
    #[serde(default)]
    pub episode_ids: Vec<String>,
    #[serde(default)]
    pub movie_ids: Vec<String>,
    #[serde(default)]
    pub season_ids: Vec<String>,
    #[serde(default)]
    pub series_ids: Vec<String>,
}

impl ReleaseInput {
    /// A release must reference at least one item of its own media type.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Release title is required".to_string());
        }

        if let Some(year) = self.year
            && !(1870..=2200).contains(&year)
        {
            return Err(format!("Release year {year} is out of range"));
        }

        let ids = match self.media_type {
            ReleaseMediaType::Movie => &self.movie_ids,
            ReleaseMediaType::Series => &self.series_ids,
            ReleaseMediaType::Season => &self.season_ids,
            ReleaseMediaType::Episode => &self.episode_ids,
        };

        if ids.iter().all(|id| id.trim().is_empty()) {
            return Err(format!(
                "A {} release must reference at least one {} id",
                self.media_type.as_str(),
                self.media_type.as_str()
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: String,
    pub title: String,
    pub year: Option<String>,
    pub imdb_id: Option<String>,
    pub plot: Option<String>,
    pub genres: Vec<String>,
    pub total_seasons: Option<i32>,
    pub omdb_data: Option<serde_json::Value>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeriesInput {
    pub title: String,
    pub year: Option<String>,
    pub imdb_id: Option<String>,
    pub plot: Option<String>,
    pub genres: Vec<String>,
    pub total_seasons: Option<i32>,
    pub omdb_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: String,
    pub series_id: String,
    pub season_number: i32,
    pub episode_number: i32,
    pub title: Option<String>,
    pub has_file: bool,
    pub file_id: Option<String>,
    pub file_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeInput {
    pub season_number: i32,
    pub episode_number: i32,
    #[serde(default)]
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(media_type: ReleaseMediaType) -> ReleaseInput {
        ReleaseInput {
            title: "Criterion Box".to_string(),
            year: Some(2012),
            media_type,
            disc_ids: vec![],
            extras: vec![],
            episode_ids: vec![],
            movie_ids: vec![],
            season_ids: vec![],
            series_ids: vec![],
        }
    }

    #[test]
    fn test_release_requires_ids_for_its_media_type() {
        let mut r = release(ReleaseMediaType::Movie);
        assert!(r.validate().is_err());

        r.series_ids.push("s1".to_string());
        assert!(r.validate().is_err());

        r.movie_ids.push("tt1375666".to_string());
        assert!(r.validate().is_ok());
    }

    #[test]
    fn test_release_rejects_blank_title_and_bad_year() {
        let mut r = release(ReleaseMediaType::Season);
        r.season_ids.push("season-1".to_string());
        r.title = "  ".to_string();
        assert!(r.validate().is_err());

        r.title = "Season One".to_string();
        r.year = Some(12);
        assert!(r.validate().is_err());
    }

    #[test]
    fn test_person_role_parsing() {
        assert_eq!("Director".parse::<PersonRole>(), Ok(PersonRole::Director));
        assert_eq!("cast".parse::<PersonRole>(), Ok(PersonRole::Actor));
        assert!("producer".parse::<PersonRole>().is_err());
    }
}
