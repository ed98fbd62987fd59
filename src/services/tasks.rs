use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Task {id} cannot be cancelled while {status:?}")]
    NotCancellable { id: String, status: TaskStatus },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    pub task_id: String,
    pub task_type: String,
    pub status: TaskStatus,
    pub progress: f64,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
}

type TaskTable = Arc<RwLock<HashMap<String, TaskInfo>>>;

/// Handed to running work so it can publish progress.
#[derive(Clone)]
pub struct TaskProgress {
    task_id: String,
    tasks: TaskTable,
}

impl TaskProgress {
    pub async fn set(&self, progress: f64) {
        if let Some(task) = self.tasks.write().await.get_mut(&self.task_id) {
            task.progress = progress.clamp(0.0, 100.0);
        }
    }
}

/// Background work bounded by a semaphore.
#[derive(Clone)]
pub struct TaskManager {
    tasks: TaskTable,
    handles: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
    permits: Arc<Semaphore>,
}

impl TaskManager {
    #[must_use]
    pub fn new(max_workers: usize) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            handles: Arc::new(Mutex::new(HashMap::new())),
            permits: Arc::new(Semaphore::new(max_workers.max(1))),
        }
    }

    pub async fn submit<F, Fut>(
        &self,
        task_type: &str,
        metadata: serde_json::Value,
        work: F,
    ) -> String
    where
        F: FnOnce(TaskProgress) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<serde_json::Value>> + Send + 'static,
    {
        let task_id = uuid::Uuid::new_v4().to_string();
        self.tasks.write().await.insert(
            task_id.clone(),
            TaskInfo {
                task_id: task_id.clone(),
                task_type: task_type.to_string(),
                status: TaskStatus::Pending,
                progress: 0.0,
                result: None,
                error: None,
                created_at: Utc::now(),
                start_time: None,
                end_time: None,
                metadata,
            },
        );

        let tasks = self.tasks.clone();
        let permits = self.permits.clone();
        let id = task_id.clone();

        let handle = tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };

            {
                let mut table = tasks.write().await;
                match table.get_mut(&id) {
                    Some(task) if task.status == TaskStatus::Pending => {
                        task.status = TaskStatus::Running;
                        task.start_time = Some(Utc::now());
                    }
                    _ => return,
                }
            }

            let reporter = TaskProgress {
                task_id: id.clone(),
                tasks: tasks.clone(),
            };
            let outcome = work(reporter).await;

            let mut table = tasks.write().await;
            if let Some(task) = table.get_mut(&id)
                && task.status == TaskStatus::Running
            {
                task.end_time = Some(Utc::now());
                match outcome {
                    Ok(value) => {
                        task.status = TaskStatus::Completed;
                        task.progress = 100.0;
                        task.result = Some(value);
                    }
                    Err(e) => {
                        warn!(task_id = %id, error = %e, "Task failed");
                        task.status = TaskStatus::Failed;
                        task.error = Some(format!("{e:#}"));
                    }
                }
            }
        });

        self.handles.lock().await.insert(task_id.clone(), handle);
        info!(task_id = %task_id, task_type, "Task submitted");

        task_id
    }

    pub async fn status(&self, task_id: &str) -> Option<TaskInfo> {
        self.tasks.read().await.get(task_id).cloned()
    }

    pub async fn cancel(&self, task_id: &str) -> Result<TaskInfo, TaskError> {
        let info = {
            let mut table = self.tasks.write().await;
            let task = table
                .get_mut(task_id)
                .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

            if task.status.is_finished() {
                return Err(TaskError::NotCancellable {
                    id: task_id.to_string(),
                    status: task.status,
                });
            }

            task.status = TaskStatus::Cancelled;
            task.end_time = Some(Utc::now());
            task.clone()
        };

        if let Some(handle) = self.handles.lock().await.remove(task_id) {
            handle.abort();
        }
        info!(task_id = %task_id, "Task cancelled");

        Ok(info)
    }

    /// Newest first.
    pub async fn list(&self, status: Option<TaskStatus>) -> Vec<TaskInfo> {
        let table = self.tasks.read().await;
        let mut tasks: Vec<TaskInfo> = table
            .values()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    pub async fn cleanup_old_tasks(&self, max_age_hours: u64) -> usize {
        let Some(cutoff) = age_cutoff(max_age_hours) else {
            return 0;
        };

        let removed: Vec<String> = {
            let mut table = self.tasks.write().await;
            let stale: Vec<String> = table
                .values()
                .filter(|t| t.status.is_finished() && t.end_time.is_some_and(|end| end < cutoff))
                .map(|t| t.task_id.clone())
                .collect();
            for id in &stale {
                table.remove(id);
            }
            stale
        };

        let mut handles = self.handles.lock().await;
        for id in &removed {
            handles.remove(id);
        }

        info!(removed_count = removed.len(), "Cleaned up tasks");
        removed.len()
    }
}

/// The instant `max_age_hours` ago, or `None` when that predates any
/// representable time and nothing can be old enough.
#[must_use]
pub fn age_cutoff(max_age_hours: u64) -> Option<DateTime<Utc>> {
    let hours = i64::try_from(max_age_hours).ok()?;
    Utc::now().checked_sub_signed(chrono::Duration::try_hours(hours)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn wait_for(manager: &TaskManager, id: &str, status: TaskStatus) -> TaskInfo {
        for _ in 0..200 {
            if let Some(task) = manager.status(id).await
                && task.status == status
            {
                return task;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {id} never reached {status:?}");
    }

    #[tokio::test]
    async fn test_task_completes_with_result() {
        let manager = TaskManager::new(2);
        let id = manager
            .submit("metadata_batch", serde_json::json!({"count": 1}), |progress| async move {
                progress.set(50.0).await;
                Ok(serde_json::json!({"done": true}))
            })
            .await;

        let task = wait_for(&manager, &id, TaskStatus::Completed).await;
        assert_eq!(task.result, Some(serde_json::json!({"done": true})));
        assert!((task.progress - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_failed_task_records_error() {
        let manager = TaskManager::new(1);
        let id = manager
            .submit("metadata_batch", serde_json::Value::Null, |_| async {
                Err::<serde_json::Value, _>(anyhow::anyhow!("ffprobe missing"))
            })
            .await;

        let task = wait_for(&manager, &id, TaskStatus::Failed).await;
        assert_eq!(task.error.as_deref(), Some("ffprobe missing"));
    }

    #[tokio::test]
    async fn test_cancel_running_task() {
        let manager = TaskManager::new(1);
        let id = manager
            .submit("slow", serde_json::Value::Null, |_| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(serde_json::Value::Null)
            })
            .await;

        wait_for(&manager, &id, TaskStatus::Running).await;
        let task = manager.cancel(&id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);

        let err = manager.cancel(&id).await.unwrap_err();
        assert!(matches!(err, TaskError::NotCancellable { .. }));
    }

    #[tokio::test]
    async fn test_cleanup_only_removes_old_finished_tasks() {
        let manager = TaskManager::new(1);
        let id = manager
            .submit("quick", serde_json::Value::Null, |_| async { Ok(serde_json::Value::Null) })
            .await;
        wait_for(&manager, &id, TaskStatus::Completed).await;

        assert_eq!(manager.cleanup_old_tasks(1).await, 0);
        assert_eq!(manager.cleanup_old_tasks(u64::MAX).await, 0);
        assert_eq!(manager.cleanup_old_tasks(0).await, 1);
        assert!(manager.list(None).await.is_empty());
    }

    #[test]
    fn test_age_cutoff_saturates_to_none() {
        assert!(age_cutoff(0).is_some_and(|c| c <= Utc::now()));
        assert!(age_cutoff(24).is_some());
        assert!(age_cutoff(u64::MAX).is_none());
        assert!(age_cutoff(u64::try_from(i64::MAX).unwrap()).is_none());
    }
}
