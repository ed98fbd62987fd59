//! Catalog endpoints: movies (via the form service), people, releases,
//! series and episodes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::validation::{validate_imdb_id, validate_search_query};
use super::{ApiError, ApiResponse, AppState, Page, PageQuery};
use crate::clients::omdb::OmdbSearchItem;
use crate::models::catalog::{
    Episode, EpisodeInput, Movie, MovieInput, Person, PersonInput, PersonRole, Release,
    ReleaseInput, ReleaseMediaType, Series, SeriesInput,
};
use crate::services::movie_form::{MovieForm, SelectOutcome, SubmitOutcome};

// ============================================================================
// Movies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    pub imdb_id: String,
    #[serde(default)]
    pub form: MovieForm,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub form: MovieForm,
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Page<Movie>>>, ApiError> {
    let limit = page.clamped_limit();
    let items = state.store().list_movies(limit, page.offset).await?;
    let total = state.store().count_movies().await?;

    Ok(Json(ApiResponse::success(Page {
        items,
        total,
        limit,
        offset: page.offset,
    })))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Movie>>, ApiError> {
    let movie = state
        .store()
        .get_movie(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Movie", &id))?;
    Ok(Json(ApiResponse::success(movie)))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<MovieInput>,
) -> Result<Json<ApiResponse<Movie>>, ApiError> {
    if input.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    let movie = state
        .store()
        .update_movie(&id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Movie", &id))?;
    Ok(Json(ApiResponse::success(movie)))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    if !state.store().delete_movie(&id).await? {
        return Err(ApiError::not_found("Movie", &id));
    }
    info!(movie_id = %id, "Movie deleted");
    Ok(Json(ApiResponse::success(format!("Movie {id} deleted"))))
}

pub async fn search_movies(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<ApiResponse<Vec<OmdbSearchItem>>>, ApiError> {
    let query = validate_search_query(&request.query)?;
    let results = state.movie_form().search(query).await.inspect_err(|e| {
        warn!(query, error = %e, "OMDB search failed");
    })?;
    Ok(Json(ApiResponse::success(results)))
}

pub async fn select_movie(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<ApiResponse<SelectOutcome>>, ApiError> {
    let imdb_id = validate_imdb_id(&request.imdb_id)?;
    let outcome = state
        .movie_form()
        .select_result(request.form, imdb_id)
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// `POST /api/movies`: 201 with the stored movie and a cleared form, or 400
/// with the per-field errors.
pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitRequest>,
) -> Result<Response, ApiError> {
    let outcome = state.movie_form().submit(&request.form).await?;

    let response = match outcome {
        saved @ SubmitOutcome::Saved { .. } => {
            (StatusCode::CREATED, Json(ApiResponse::success(saved))).into_response()
        }
        rejected @ SubmitOutcome::Rejected { .. } => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::failure(
                "Form has validation errors",
                "VALIDATION_ERROR",
                rejected,
            )),
        )
            .into_response(),
    };
    Ok(response)
}

// ============================================================================
// People
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PeopleQuery {
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkMovieRequest {
    pub movie_id: String,
}

pub async fn list_people(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PeopleQuery>,
) -> Result<Json<ApiResponse<Vec<Person>>>, ApiError> {
    let role = query
        .role
        .as_deref()
        .map(str::parse::<PersonRole>)
        .transpose()
        .map_err(ApiError::validation)?;
    let people = state.store().list_people(role).await?;
    Ok(Json(ApiResponse::success(people)))
}

pub async fn create_person(
    State(state): State<Arc<AppState>>,
    Json(input): Json<PersonInput>,
) -> Result<(StatusCode, Json<ApiResponse<Person>>), ApiError> {
    if input.full_name.trim().is_empty() {
        return Err(ApiError::validation("Full name is required"));
    }
    let person = state.store().add_person(&input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(person))))
}

pub async fn get_person(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Person>>, ApiError> {
    let person = state
        .store()
        .get_person(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Person", &id))?;
    Ok(Json(ApiResponse::success(person)))
}

pub async fn update_person(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<PersonInput>,
) -> Result<Json<ApiResponse<Person>>, ApiError> {
    if input.full_name.trim().is_empty() {
        return Err(ApiError::validation("Full name is required"));
    }
    let person = state
        .store()
        .update_person(&id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Person", &id))?;
    Ok(Json(ApiResponse::success(person)))
}

pub async fn delete_person(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    if !state.store().delete_person(&id).await? {
        return Err(ApiError::not_found("Person", &id));
    }
    Ok(Json(ApiResponse::success(format!("Person {id} deleted"))))
}

pub async fn link_person_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<LinkMovieRequest>,
) -> Result<Json<ApiResponse<Person>>, ApiError> {
    let person = state
        .store()
        .link_person_movie(&id, &request.movie_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Person", &id))?;
    Ok(Json(ApiResponse::success(person)))
}

// ============================================================================
// Releases
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseQuery {
    pub media_type: Option<ReleaseMediaType>,
}

pub async fn list_releases(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReleaseQuery>,
) -> Result<Json<ApiResponse<Vec<Release>>>, ApiError> {
    let releases = state.store().list_releases(query.media_type).await?;
    Ok(Json(ApiResponse::success(releases)))
}

pub async fn create_release(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ReleaseInput>,
) -> Result<(StatusCode, Json<ApiResponse<Release>>), ApiError> {
    input.validate().map_err(ApiError::validation)?;
    let release = state.store().add_release(&input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(release))))
}

pub async fn get_release(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Release>>, ApiError> {
    let release = state
        .store()
        .get_release(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Release", &id))?;
    Ok(Json(ApiResponse::success(release)))
}

pub async fn delete_release(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    if !state.store().delete_release(&id).await? {
        return Err(ApiError::not_found("Release", &id));
    }
    Ok(Json(ApiResponse::success(format!("Release {id} deleted"))))
}

// ============================================================================
// Series & episodes
// ============================================================================

pub async fn list_series(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Series>>>, ApiError> {
    let series = state.store().list_series().await?;
    Ok(Json(ApiResponse::success(series)))
}

pub async fn create_series(
    State(state): State<Arc<AppState>>,
    Json(input): Json<SeriesInput>,
) -> Result<(StatusCode, Json<ApiResponse<Series>>), ApiError> {
    if input.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    let series = state.store().add_series(&input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(series))))
}

pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Series>>, ApiError> {
    let series = state
        .store()
        .get_series(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Series", &id))?;
    Ok(Json(ApiResponse::success(series)))
}

pub async fn list_episodes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Episode>>>, ApiError> {
    if state.store().get_series(&id).await?.is_none() {
        return Err(ApiError::not_found("Series", &id));
    }
    let episodes = state.store().list_episodes(&id).await?;
    Ok(Json(ApiResponse::success(episodes)))
}

pub async fn create_episode(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<EpisodeInput>,
) -> Result<(StatusCode, Json<ApiResponse<Episode>>), ApiError> {
    if input.season_number < 0 || input.episode_number <= 0 {
        return Err(ApiError::validation(
            "Season must be >= 0 and episode must be a positive number",
        ));
    }
    if state.store().get_series(&id).await?.is_none() {
        return Err(ApiError::not_found("Series", &id));
    }
    let episode = state.store().add_episode(&id, &input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(episode))))
}
