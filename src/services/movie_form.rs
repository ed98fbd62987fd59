//! Movie add/edit form: editable fields plus per-field validation errors,
//! populated from OMDB records and written to the catalog on submit.

use crate::clients::omdb::{OmdbClient, OmdbMovie, OmdbSearchItem};
use crate::db::{Store, StoreError};
use crate::models::catalog::{Movie, MovieInput, Rating};
use crate::services::image::ImageService;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::{info, warn};

const NOT_AVAILABLE: &str = "N/A";

/// Where full records come from.
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<OmdbSearchItem>>;

    async fn fetch_record(&self, imdb_id: &str) -> anyhow::Result<Option<OmdbMovie>>;
}

/// Where submitted movies go.
#[async_trait::async_trait]
pub trait CatalogWriter: Send + Sync {
    async fn find_by_imdb_id(&self, imdb_id: &str) -> anyhow::Result<Option<Movie>>;

    async fn add_movie(&self, input: &MovieInput) -> anyhow::Result<Movie>;
}

/// Local copies of selected posters.
#[async_trait::async_trait]
pub trait PosterStore: Send + Sync {
    /// Returns the stored file name.
    async fn download(&self, url: &str, key: &str) -> anyhow::Result<String>;

    async fn discard(&self, file_name: &str) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
impl MetadataProvider for OmdbClient {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<OmdbSearchItem>> {
        self.search_by_text(query).await
    }

    async fn fetch_record(&self, imdb_id: &str) -> anyhow::Result<Option<OmdbMovie>> {
        self.retrieve_media_data_by_id(imdb_id).await
    }
}

#[async_trait::async_trait]
impl CatalogWriter for Store {
    async fn find_by_imdb_id(&self, imdb_id: &str) -> anyhow::Result<Option<Movie>> {
        self.find_movie_by_imdb_id(imdb_id).await
    }

    async fn add_movie(&self, input: &MovieInput) -> anyhow::Result<Movie> {
        Self::add_movie(self, input).await
    }
}

#[async_trait::async_trait]
impl PosterStore for ImageService {
    async fn download(&self, url: &str, key: &str) -> anyhow::Result<String> {
        self.download_poster(url, key).await
    }

    async fn discard(&self, file_name: &str) -> anyhow::Result<()> {
        self.remove_image(file_name).await
    }
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Metadata provider error: {0}")]
    Provider(String),

    #[error("Catalog store error: {0}")]
    Store(String),

    #[error("Movie already exists: {0}")]
    Duplicate(String),

    #[error("No metadata record for {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct MovieForm {
    pub title: String,
    pub year: String,
    pub rated: String,
    pub plot: String,
    pub release_date: String,
    pub runtime: String,
    pub countries: Vec<String>,
    pub directors: Vec<String>,
    pub writers: Vec<String>,
    pub cast: Vec<String>,
    pub genres: Vec<String>,
    pub languages: Vec<String>,
    pub links: Vec<String>,
    pub image_files: Vec<String>,
    pub ratings: Vec<Rating>,
    pub omdb_data: Option<OmdbMovie>,
    /// Posters added by record selections, replaced on the next selection.
    pub selected_posters: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FormErrors {
    pub title: Vec<String>,
    pub year: Vec<String>,
    pub runtime: Vec<String>,
    pub release_date: Vec<String>,
    pub links: Vec<String>,
    pub ratings: Vec<String>,
}

impl FormErrors {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !(self.title.is_empty()
            && self.year.is_empty()
            && self.runtime.is_empty()
            && self.release_date.is_empty()
            && self.links.is_empty()
            && self.ratings.is_empty())
    }
}

fn runtime_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+:[0-5]\d:[0-5]\d$").expect("Invalid regex pattern defined in code"))
}

fn release_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{1,2}-[A-Za-z]{3}-\d{4}$").expect("Invalid regex pattern defined in code")
    })
}

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}$").expect("Invalid regex pattern defined in code"))
}

fn present(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != NOT_AVAILABLE)
}

/// Comma separated provider text into trimmed, non-empty tokens.
#[must_use]
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    present(raw)
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty() && *t != NOT_AVAILABLE)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// "142 min" becomes "2:22:00".
#[must_use]
pub fn convert_runtime(raw: Option<&str>) -> Option<String> {
    let minutes: u32 = present(raw)?.split_whitespace().next()?.parse().ok()?;
    Some(format!("{}:{:02}:00", minutes / 60, minutes % 60))
}

/// "16 Jul 2010" becomes "16-Jul-2010".
#[must_use]
pub fn convert_release_date(raw: Option<&str>) -> Option<String> {
    let date = present(raw)?;
    Some(date.split_whitespace().collect::<Vec<_>>().join("-"))
}

impl MovieForm {
    /// Populates every field from one provider record. List fields are
    /// appended; posters from earlier selections are swapped for the new one.
    pub fn apply_omdb_record(&mut self, record: &OmdbMovie) {
        if let Some(title) = present(Some(&record.title)) {
            self.title = title.to_string();
        }
        if let Some(year) = present(record.year.as_deref()) {
            self.year = year.to_string();
        }
        if let Some(rated) = present(record.rated.as_deref()) {
            self.rated = rated.to_string();
        }
        if let Some(plot) = present(record.plot.as_deref()) {
            self.plot = plot.to_string();
        }
        if let Some(runtime) = convert_runtime(record.runtime.as_deref()) {
            self.runtime = runtime;
        }
        if let Some(date) = convert_release_date(record.released.as_deref()) {
            self.release_date = date;
        }

        self.directors.extend(split_list(record.director.as_deref()));
        self.writers.extend(split_list(record.writer.as_deref()));
        self.genres.extend(split_list(record.genre.as_deref()));
        self.languages.extend(split_list(record.language.as_deref()));
        self.cast.extend(split_list(record.actors.as_deref()));
        self.countries.extend(split_list(record.country.as_deref()));

        let previous = std::mem::take(&mut self.selected_posters);
        self.image_files.retain(|img| !previous.contains(img));
        if let Some(poster) = present(record.poster.as_deref()) {
            self.image_files.push(poster.to_string());
            self.selected_posters.push(poster.to_string());
        }

        self.ratings.extend(record.ratings.iter().map(|r| Rating {
            source: r.source.clone(),
            value: r.value.clone(),
        }));

        self.omdb_data = Some(record.clone());
    }

    #[must_use]
    pub fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::default();

        if self.title.trim().is_empty() {
            errors.title.push("Title is required".to_string());
        }

        let year = self.year.trim();
        if !year.is_empty() && !year_regex().is_match(year) {
            errors.year.push(format!("Year must be four digits, got {year:?}"));
        }

        let runtime = self.runtime.trim();
        if !runtime.is_empty() && !runtime_regex().is_match(runtime) {
            errors
                .runtime
                .push(format!("Runtime must look like H:MM:SS, got {runtime:?}"));
        }

        let date = self.release_date.trim();
        if !date.is_empty() && !release_date_regex().is_match(date) {
            errors
                .release_date
                .push(format!("Release date must look like 16-Jul-2010, got {date:?}"));
        }

        for link in &self.links {
            let ok = url::Url::parse(link)
                .is_ok_and(|u| matches!(u.scheme(), "http" | "https"));
            if !ok {
                errors.links.push(format!("Invalid link: {link}"));
            }
        }

        for (i, rating) in self.ratings.iter().enumerate() {
            if rating.source.trim().is_empty() || rating.value.trim().is_empty() {
                errors
                    .ratings
                    .push(format!("Rating {} needs both a source and a value", i + 1));
            }
        }

        errors
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn imdb_id(&self) -> Option<&str> {
        self.omdb_data
            .as_ref()
            .map(|d| d.imdb_id.as_str())
            .filter(|id| !id.is_empty())
    }

    #[must_use]
    pub fn to_input(&self) -> MovieInput {
        let opt = |s: &str| Some(s.trim().to_string()).filter(|s| !s.is_empty());

        MovieInput {
            title: self.title.trim().to_string(),
            year: opt(&self.year),
            rated: opt(&self.rated),
            release_date: opt(&self.release_date),
            runtime: opt(&self.runtime),
            plot: opt(&self.plot),
            directors: self.directors.clone(),
            writers: self.writers.clone(),
            cast: self.cast.clone(),
            genres: self.genres.clone(),
            languages: self.languages.clone(),
            countries: self.countries.clone(),
            ratings: self.ratings.clone(),
            links: self.links.clone(),
            image_files: self.image_files.clone(),
            omdb_data: self
                .omdb_data
                .as_ref()
                .and_then(|d| serde_json::to_value(d).ok()),
            imdb_id: self.imdb_id().map(String::from),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SelectOutcome {
    Populated { form: MovieForm },
    Duplicate { existing: Box<Movie> },
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubmitOutcome {
    Saved { movie: Box<Movie>, form: MovieForm },
    Rejected { errors: FormErrors },
}

pub struct MovieFormService {
    provider: Arc<dyn MetadataProvider>,
    writer: Arc<dyn CatalogWriter>,
    posters: Option<Arc<dyn PosterStore>>,
}

impl MovieFormService {
    #[must_use]
    pub fn new(provider: Arc<dyn MetadataProvider>, writer: Arc<dyn CatalogWriter>) -> Self {
        Self {
            provider,
            writer,
            posters: None,
        }
    }

    /// Downloads selected posters into the images directory on submit.
    #[must_use]
    pub fn with_poster_downloads(mut self, images: Arc<dyn PosterStore>) -> Self {
        self.posters = Some(images);
        self
    }

    pub async fn search(&self, query: &str) -> Result<Vec<OmdbSearchItem>, FormError> {
        self.provider
            .search(query)
            .await
            .map_err(|e| FormError::Provider(format!("{e:#}")))
    }

    /// Short-circuits on a stored movie with the same IMDb id; otherwise
    /// fetches the full record once and merges it into the form.
    pub async fn select_result(
        &self,
        mut form: MovieForm,
        imdb_id: &str,
    ) -> Result<SelectOutcome, FormError> {
        if let Some(existing) = self
            .writer
            .find_by_imdb_id(imdb_id)
            .await
            .map_err(|e| FormError::Store(format!("{e:#}")))?
        {
            info!(imdb_id, movie_id = %existing.id, "Selected movie already in catalog");
            return Ok(SelectOutcome::Duplicate {
                existing: Box::new(existing),
            });
        }

        let record = self
            .provider
            .fetch_record(imdb_id)
            .await
            .map_err(|e| FormError::Provider(format!("{e:#}")))?
            .ok_or_else(|| FormError::NotFound(imdb_id.to_string()))?;

        form.apply_omdb_record(&record);
        Ok(SelectOutcome::Populated { form })
    }

    /// Writes one movie when the form validates. A rejected form is never written.
    pub async fn submit(&self, form: &MovieForm) -> Result<SubmitOutcome, FormError> {
        let errors = form.validate();
        if errors.has_errors() {
            return Ok(SubmitOutcome::Rejected { errors });
        }

        let mut input = form.to_input();
        let downloaded = self.download_posters(form, &mut input).await;

        let movie = match self.writer.add_movie(&input).await {
            Ok(movie) => movie,
            Err(e) => {
                self.discard_posters(&downloaded).await;
                return Err(match e.downcast_ref::<StoreError>() {
                    Some(StoreError::AlreadyExists { id, .. }) => FormError::Duplicate(id.clone()),
                    None => FormError::Store(format!("{e:#}")),
                });
            }
        };

        info!(movie_id = %movie.id, title = %movie.title, "Movie saved from form");

        let mut form = form.clone();
        form.reset();
        Ok(SubmitOutcome::Saved {
            movie: Box::new(movie),
            form,
        })
    }

    /// Swaps each selected poster URL in `image_files` for its local copy.
    /// Failed downloads keep the remote URL.
    async fn download_posters(&self, form: &MovieForm, input: &mut MovieInput) -> Vec<String> {
        let Some(posters) = &self.posters else {
            return Vec::new();
        };
        let key = input
            .imdb_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut downloaded = Vec::new();
        for url in &form.selected_posters {
            match posters.download(url, &key).await {
                Ok(local) => {
                    match input.image_files.iter_mut().find(|img| img.as_str() == url.as_str()) {
                        Some(slot) => slot.clone_from(&local),
                        None => input.image_files.push(local.clone()),
                    }
                    downloaded.push(local);
                }
                Err(e) => warn!(url = %url, error = %e, "Poster download failed"),
            }
        }
        downloaded
    }

    async fn discard_posters(&self, downloaded: &[String]) {
        let Some(posters) = &self.posters else {
            return;
        };
        for file_name in downloaded {
            if let Err(e) = posters.discard(file_name).await {
                warn!(file = %file_name, error = %e, "Could not remove unused poster");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::omdb::OmdbRating;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn inception() -> OmdbMovie {
        OmdbMovie {
            title: "Inception".into(),
            year: Some("2010".into()),
            rated: Some("PG-13".into()),
            released: Some("16 Jul 2010".into()),
            runtime: Some("148 min".into()),
            genre: Some("Action, Adventure, Sci-Fi".into()),
            director: Some("Christopher Nolan".into()),
            writer: Some("Christopher Nolan".into()),
            actors: Some("Leonardo DiCaprio, Joseph Gordon-Levitt , Elliot Page".into()),
            language: Some("English, Japanese, French".into()),
            country: Some("United States, United Kingdom".into()),
            poster: Some("https://img.example/inception.jpg".into()),
            ratings: vec![OmdbRating {
                source: "Internet Movie Database".into(),
                value: "8.8/10".into(),
            }],
            imdb_id: "tt1375666".into(),
            ..Default::default()
        }
    }

    #[derive(Default)]
    struct MockProvider {
        fetches: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl MetadataProvider for MockProvider {
        async fn search(&self, _query: &str) -> anyhow::Result<Vec<OmdbSearchItem>> {
            Ok(vec![])
        }

        async fn fetch_record(&self, _imdb_id: &str) -> anyhow::Result<Option<OmdbMovie>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Some(inception()))
        }
    }

    #[derive(Default)]
    struct MockWriter {
        existing: Option<Movie>,
        writes: AtomicUsize,
        conflict: bool,
    }

    #[derive(Default)]
    struct MockPosters {
        stored: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl PosterStore for MockPosters {
        async fn download(&self, _url: &str, key: &str) -> anyhow::Result<String> {
            let name = format!("{key}_poster.jpg");
            self.stored.lock().unwrap().push(name.clone());
            Ok(name)
        }

        async fn discard(&self, file_name: &str) -> anyhow::Result<()> {
            self.stored.lock().unwrap().retain(|f| f != file_name);
            Ok(())
        }
    }

    fn stored_movie(input: &MovieInput) -> Movie {
        Movie {
            id: input.imdb_id.clone().unwrap_or_else(|| "generated".into()),
            title: input.title.clone(),
            year: input.year.clone(),
            rated: None,
            release_date: input.release_date.clone(),
            runtime: input.runtime.clone(),
            plot: None,
            directors: input.directors.clone(),
            writers: vec![],
            cast: input.cast.clone(),
            genres: vec![],
            languages: vec![],
            countries: vec![],
            ratings: vec![],
            links: vec![],
            image_files: input.image_files.clone(),
            omdb_data: None,
            imdb_id: input.imdb_id.clone(),
            assignment_summary: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[async_trait::async_trait]
    impl CatalogWriter for MockWriter {
        async fn find_by_imdb_id(&self, _imdb_id: &str) -> anyhow::Result<Option<Movie>> {
            Ok(self.existing.clone())
        }

        async fn add_movie(&self, input: &MovieInput) -> anyhow::Result<Movie> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.conflict {
                return Err(StoreError::AlreadyExists {
                    entity: "movie",
                    id: "tt1375666".into(),
                }
                .into());
            }
            Ok(stored_movie(input))
        }
    }

    #[test]
    fn test_split_list_counts_tokens() {
        let raw = "Leonardo DiCaprio, Joseph Gordon-Levitt, Elliot Page";
        assert_eq!(split_list(Some(raw)).len(), raw.matches(',').count() + 1);
        assert_eq!(split_list(Some(" a ,, b ,")), vec!["a", "b"]);
        assert!(split_list(Some("N/A")).is_empty());
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn test_runtime_and_release_conversion() {
        assert_eq!(convert_runtime(Some("142 min")).as_deref(), Some("2:22:00"));
        assert_eq!(convert_runtime(Some("59 min")).as_deref(), Some("0:59:00"));
        assert_eq!(convert_runtime(Some("N/A")), None);
        assert_eq!(
            convert_release_date(Some("16 Jul 2010")).as_deref(),
            Some("16-Jul-2010")
        );
    }

    #[test]
    fn test_apply_appends_lists_after_manual_entries() {
        let mut form = MovieForm {
            directors: vec!["Manual Director".into()],
            ..Default::default()
        };
        form.apply_omdb_record(&inception());

        assert_eq!(form.directors, vec!["Manual Director", "Christopher Nolan"]);
        assert_eq!(form.cast.len(), 3);
        assert_eq!(form.cast[1], "Joseph Gordon-Levitt");
        assert_eq!(form.runtime, "2:28:00");
        assert_eq!(form.release_date, "16-Jul-2010");
        assert_eq!(form.ratings.len(), 1);
        assert!(!form.validate().has_errors());
    }

    #[test]
    fn test_reselection_swaps_poster_and_keeps_manual_images() {
        let mut form = MovieForm {
            image_files: vec!["manual.jpg".into()],
            ..Default::default()
        };
        form.apply_omdb_record(&inception());

        let mut other = inception();
        other.poster = Some("https://img.example/other.jpg".into());
        form.apply_omdb_record(&other);

        assert_eq!(
            form.image_files,
            vec!["manual.jpg", "https://img.example/other.jpg"]
        );
    }

    #[test]
    fn test_validate_reports_each_field() {
        let form = MovieForm {
            year: "20x0".into(),
            runtime: "148 min".into(),
            release_date: "July 16th".into(),
            links: vec!["ftp://example.com".into(), "https://ok.example".into()],
            ratings: vec![Rating {
                source: "IMDb".into(),
                value: String::new(),
            }],
            ..Default::default()
        };
        let errors = form.validate();

        assert_eq!(errors.title.len(), 1);
        assert_eq!(errors.year.len(), 1);
        assert_eq!(errors.runtime.len(), 1);
        assert_eq!(errors.release_date.len(), 1);
        assert_eq!(errors.links.len(), 1);
        assert_eq!(errors.ratings.len(), 1);
        assert!(errors.has_errors());
    }

    #[tokio::test]
    async fn test_rejected_form_never_writes() {
        let writer = Arc::new(MockWriter::default());
        let service = MovieFormService::new(Arc::new(MockProvider::default()), writer.clone());

        let outcome = service.submit(&MovieForm::default()).await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Rejected { .. }));
        assert_eq!(writer.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_writes_once_and_resets() {
        let writer = Arc::new(MockWriter::default());
        let service = MovieFormService::new(Arc::new(MockProvider::default()), writer.clone());
        let mut form = MovieForm::default();
        form.apply_omdb_record(&inception());

        let SubmitOutcome::Saved { movie, form } = service.submit(&form).await.unwrap() else {
            panic!("expected the form to be saved");
        };

        assert_eq!(movie.id, "tt1375666");
        assert_eq!(form, MovieForm::default());
        assert_eq!(writer.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_replaces_poster_url_with_local_copy() {
        let posters = Arc::new(MockPosters::default());
        let service = MovieFormService::new(
            Arc::new(MockProvider::default()),
            Arc::new(MockWriter::default()),
        )
        .with_poster_downloads(posters.clone());
        let mut form = MovieForm::default();
        form.apply_omdb_record(&inception());

        let SubmitOutcome::Saved { movie, .. } = service.submit(&form).await.unwrap() else {
            panic!("expected the form to be saved");
        };

        assert_eq!(movie.image_files, vec!["tt1375666_poster.jpg"]);
        assert_eq!(*posters.stored.lock().unwrap(), vec!["tt1375666_poster.jpg"]);
    }

    #[tokio::test]
    async fn test_failed_write_discards_downloaded_posters() {
        let posters = Arc::new(MockPosters::default());
        let writer = Arc::new(MockWriter {
            conflict: true,
            ..Default::default()
        });
        let service = MovieFormService::new(Arc::new(MockProvider::default()), writer)
            .with_poster_downloads(posters.clone());
        let mut form = MovieForm::default();
        form.apply_omdb_record(&inception());

        let err = service.submit(&form).await.unwrap_err();

        assert!(matches!(err, FormError::Duplicate(id) if id == "tt1375666"));
        assert!(posters.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_short_circuits_fetch() {
        let provider = Arc::new(MockProvider::default());
        let writer = Arc::new(MockWriter {
            existing: Some(stored_movie(&MovieInput {
                title: "Inception".into(),
                imdb_id: Some("tt1375666".into()),
                ..Default::default()
            })),
            ..Default::default()
        });
        let service = MovieFormService::new(provider.clone(), writer);

        let outcome = service
            .select_result(MovieForm::default(), "tt1375666")
            .await
            .unwrap();

        assert!(matches!(outcome, SelectOutcome::Duplicate { .. }));
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_select_fetches_once_and_populates() {
        let provider = Arc::new(MockProvider::default());
        let service =
            MovieFormService::new(provider.clone(), Arc::new(MockWriter::default()));

        let SelectOutcome::Populated { form } = service
            .select_result(MovieForm::default(), "tt1375666")
            .await
            .unwrap()
        else {
            panic!("expected a populated form");
        };

        assert_eq!(form.title, "Inception");
        assert_eq!(form.imdb_id(), Some("tt1375666"));
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
    }
}
