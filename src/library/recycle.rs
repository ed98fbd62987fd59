use super::transfer;
use crate::parser::size::format_size;
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Trash directory for deleted library items. Entries are prefixed with the
/// time they were trashed and purged after the retention window.
#[derive(Clone)]
pub struct RecycleBin {
    path: PathBuf,

    retention_days: u32,
}

impl RecycleBin {
    pub fn new(path: impl Into<PathBuf>, retention_days: u32) -> Self {
        Self {
            path: path.into(),
            retention_days,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn ensure_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.path).await?;
        Ok(())
    }

    /// Moves a file or directory into the bin.
    pub async fn recycle(&self, item_path: &Path, reason: &str) -> Result<RecycledItem> {
        self.ensure_exists().await?;

        let name = item_path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid path: {}", item_path.display()))?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let mut recycled_path = self
            .path
            .join(format!("{}_{}", timestamp, name.to_string_lossy()));

        // Two deletes of the same name within one second.
        let mut attempt = 1;
        while fs::try_exists(&recycled_path).await.unwrap_or(false) {
            recycled_path = self.path.join(format!(
                "{}_{}_{}",
                timestamp,
                attempt,
                name.to_string_lossy()
            ));
            attempt += 1;
        }

        let source = item_path.to_path_buf();
        let target = recycled_path.clone();
        let size = tokio::task::spawn_blocking(move || -> Result<u64> {
            let size = transfer::path_size(&source);
            transfer::move_path(&source, &target)?;
            Ok(size)
        })
        .await??;

        info!(
            path = ?item_path,
            recycled = ?recycled_path,
            reason,
            "Moved to trash"
        );

        Ok(RecycledItem {
            original_path: item_path.to_path_buf(),
            recycled_path,
            size,
            reason: reason.to_string(),
        })
    }

    pub async fn restore(&self, recycled_path: &Path, original_path: &Path) -> Result<()> {
        if !recycled_path.starts_with(&self.path) {
            anyhow::bail!("{} is not inside the trash", recycled_path.display());
        }
        if fs::try_exists(original_path).await.unwrap_or(false) {
            anyhow::bail!("Restore target already exists: {}", original_path.display());
        }
        if let Some(parent) = original_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let (src, dst) = (recycled_path.to_path_buf(), original_path.to_path_buf());
        tokio::task::spawn_blocking(move || transfer::move_path(&src, &dst)).await??;
        info!("Restored {:?} -> {:?}", recycled_path, original_path);

        Ok(())
    }

    /// Purges entries older than the retention window.
    pub async fn cleanup(&self) -> Result<CleanupStats> {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(i64::from(self.retention_days));
        let stats = self
            .purge(|modified| modified < cutoff)
            .await?;

        if stats.items_deleted > 0 {
            info!(
                "Trash cleanup: deleted {} items, freed {}",
                stats.items_deleted,
                stats.bytes_freed_human()
            );
        }

        Ok(stats)
    }

    pub async fn empty(&self) -> Result<CleanupStats> {
        let stats = self.purge(|_| true).await?;
        info!(
            "Emptied trash: deleted {} items, freed {}",
            stats.items_deleted,
            stats.bytes_freed_human()
        );
        Ok(stats)
    }

    async fn purge(
        &self,
        should_delete: impl Fn(chrono::DateTime<chrono::Utc>) -> bool,
    ) -> Result<CleanupStats> {
        let mut stats = CleanupStats::default();

        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(stats);
        }

        let mut entries = fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            let Ok(metadata) = fs::symlink_metadata(&path).await else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            if !should_delete(modified.into()) {
                continue;
            }

            let target = path.clone();
            let result = tokio::task::spawn_blocking(move || {
                let size = transfer::path_size(&target);
                transfer::remove_path(&target).map(|()| size)
            })
            .await?;

            match result {
                Ok(size) => {
                    debug!("Purged {:?}", path);
                    stats.items_deleted += 1;
                    stats.bytes_freed += size;
                }
                Err(e) => {
                    warn!("Failed to delete {:?}: {}", path, e);
                    stats.errors += 1;
                }
            }
        }

        Ok(stats)
    }

    pub async fn get_size(&self) -> Result<u64> {
        let path = self.path.clone();
        Ok(tokio::task::spawn_blocking(move || transfer::path_size(&path)).await?)
    }

    pub async fn list(&self) -> Result<Vec<PathBuf>> {
        let mut items = Vec::new();

        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(items);
        }

        let mut entries = fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            items.push(entry.path());
        }

        items.sort();

        Ok(items)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecycledItem {
    pub original_path: PathBuf,
    pub recycled_path: PathBuf,
    pub size: u64,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStats {
    pub items_deleted: usize,
    pub bytes_freed: u64,
    pub errors: usize,
}

impl CleanupStats {
    #[must_use]
    pub fn bytes_freed_human(&self) -> String {
        format_size(self.bytes_freed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recycle_and_restore_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let bin = RecycleBin::new(tmp.path().join(".trash"), 7);

        let dir = tmp.path().join("Movie (2010)");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("movie.mkv"), b"data").unwrap();

        let item = bin.recycle(&dir, "delete").await.unwrap();
        assert!(!dir.exists());
        assert_eq!(item.size, 4);
        assert_eq!(bin.list().await.unwrap().len(), 1);

        bin.restore(&item.recycled_path, &dir).await.unwrap();
        assert!(dir.join("movie.mkv").exists());
        assert!(bin.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_name_twice_does_not_collide() {
        let tmp = tempfile::tempdir().unwrap();
        let bin = RecycleBin::new(tmp.path().join(".trash"), 7);

        for _ in 0..2 {
            let file = tmp.path().join("a.mkv");
            std::fs::write(&file, b"x").unwrap();
            bin.recycle(&file, "delete").await.unwrap();
        }

        assert_eq!(bin.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_items() {
        let tmp = tempfile::tempdir().unwrap();
        let bin = RecycleBin::new(tmp.path().join(".trash"), 7);
        let file = tmp.path().join("b.mkv");
        std::fs::write(&file, b"x").unwrap();
        bin.recycle(&file, "delete").await.unwrap();

        let stats = bin.cleanup().await.unwrap();
        assert_eq!(stats.items_deleted, 0);

        let stats = bin.empty().await.unwrap();
        assert_eq!(stats.items_deleted, 1);
        assert_eq!(stats.bytes_freed, 1);
    }
}
