use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::validation::validate_max_age_hours;
use super::{ApiError, ApiResponse, AppState};
use crate::services::tasks::{TaskInfo, TaskStatus};

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Deserialize)]
pub struct TaskCleanupQuery {
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
}

const fn default_max_age_hours() -> u64 {
    24
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCleanupResult {
    pub removed_count: usize,
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TaskListQuery>,
) -> Json<ApiResponse<Vec<TaskInfo>>> {
    Json(ApiResponse::success(state.tasks().list(query.status).await))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TaskInfo>>, ApiError> {
    let task = state
        .tasks()
        .status(&id)
        .await
        .ok_or_else(|| ApiError::not_found("Task", &id))?;
    Ok(Json(ApiResponse::success(task)))
}

pub async fn cancel_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TaskInfo>>, ApiError> {
    let task = state.tasks().cancel(&id).await?;
    Ok(Json(ApiResponse::success(task)))
}

pub async fn cleanup_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TaskCleanupQuery>,
) -> Result<Json<ApiResponse<TaskCleanupResult>>, ApiError> {
    let hours = validate_max_age_hours(query.max_age_hours)?;
    let removed_count = state.tasks().cleanup_old_tasks(hours).await;
    Ok(Json(ApiResponse::success(TaskCleanupResult { removed_count })))
}
