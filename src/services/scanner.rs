use crate::config::ScannerConfig;
use crate::constants::scan::{PROGRESS_LOG_EVERY, SKIPPED_DIRS, WALK_CHANNEL_CAPACITY};
use crate::db::Store;
use crate::models::scan::{
    DirectoryEntry, DuplicateReport, ExistingItem, FieldDifference, FileEntry, ItemDifference,
    ScanErrorEntry, ScanItem, ScanProgress, ScanSnapshot, ScanStatus,
};
use crate::parser::filename::{classify_directory, classify_file, parse_media_filename};
use crate::services::error::LibraryError;
use crate::services::filesystem::{FileSystemManager, file_metadata};
use crate::services::metadata::MetadataExtractor;
use crate::services::tasks::age_cutoff;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanOptions {
    pub extract_metadata: bool,
    pub check_duplicates: bool,
    pub user_id: Option<String>,
    pub existing_files: Option<Vec<ExistingItem>>,
    pub existing_directories: Option<Vec<ExistingItem>>,
    /// Falls back to `scanner.persist_results`.
    pub save_results: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResults {
    #[serde(flatten)]
    pub scan: ScanSnapshot,
    pub items: Vec<ScanItem>,
}

/// Tracks background scans of library folders.
#[derive(Clone)]
pub struct LibraryScanner {
    scans: Arc<RwLock<HashMap<String, ScanProgress>>>,
    config: ScannerConfig,
    fs: FileSystemManager,
    extractor: MetadataExtractor,
    store: Store,
}

impl LibraryScanner {
    #[must_use]
    pub fn new(
        config: ScannerConfig,
        fs: FileSystemManager,
        extractor: MetadataExtractor,
        store: Store,
    ) -> Self {
        Self {
            scans: Arc::new(RwLock::new(HashMap::new())),
            config,
            fs,
            extractor,
            store,
        }
    }

    pub async fn start_scan(
        &self,
        library_path: &str,
        options: ScanOptions,
    ) -> Result<String, LibraryError> {
        let root = self.fs.validate_path_security(Path::new(library_path))?;
        if !root.is_dir() {
            return Err(LibraryError::ScanOperation(format!(
                "Library path is not a directory: {library_path}"
            )));
        }

        let scan_id = uuid::Uuid::new_v4().to_string();
        {
            let mut scans = self.scans.write().await;
            let active = scans
                .values()
                .filter(|s| s.status == ScanStatus::Scanning)
                .count();
            if active >= self.config.max_concurrent_scans {
                return Err(LibraryError::ScanOperation(
                    "Maximum concurrent scans reached".to_string(),
                ));
            }

            let mut progress = ScanProgress::new(scan_id.clone(), library_path.to_string());
            progress.current_path = library_path.to_string();
            scans.insert(scan_id.clone(), progress);
        }

        info!(
            event = "library_scan_started",
            scan_id = %scan_id,
            path = %library_path,
            "Scan started"
        );

        let scanner = self.clone();
        let id = scan_id.clone();
        let library_path = library_path.to_string();
        tokio::spawn(async move {
            scanner.run_scan(id, library_path, root, options).await;
        });

        Ok(scan_id)
    }

    async fn run_scan(
        &self,
        scan_id: String,
        library_path: String,
        root: PathBuf,
        options: ScanOptions,
    ) {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_secs(self.config.scan_timeout_minutes * 60);

        let outcome =
            tokio::time::timeout(timeout, self.perform_scan(&scan_id, &root, &options)).await;

        let result = match outcome {
            Ok(result) => result,
            Err(_) => Err(LibraryError::ScanOperation(format!(
                "Scan timed out after {} minutes",
                self.config.scan_timeout_minutes
            ))),
        };

        if let Err(e) = result {
            error!(event = "library_scan_failed", scan_id = %scan_id, error = %e, "Scan failed");
            self.update(&scan_id, |p| {
                p.status = ScanStatus::Error;
                p.errors.push(ScanErrorEntry::new(
                    "scan_error",
                    e.to_string(),
                    Some(library_path.clone()),
                ));
            })
            .await;
        } else if options.check_duplicates
            && options.user_id.is_some()
            && !self.is_cancelled(&scan_id).await
        {
            self.filter_duplicates(&scan_id, &library_path, &options).await;
        }

        let Some(mut finished) = self.update(&scan_id, |p| p.clone()).await else {
            return;
        };
        if finished.status == ScanStatus::Scanning {
            finished.status = ScanStatus::Completed;
        }
        let end_time = *finished.end_time.get_or_insert_with(Utc::now);

        // Rows land before the status flips so a completed scan is always queryable.
        let persist = options.save_results.unwrap_or(self.config.persist_results);
        if persist && finished.status == ScanStatus::Completed {
            self.persist(&finished).await;
        }

        let Some(snapshot) = self
            .update(&scan_id, |p| {
                if p.status == ScanStatus::Scanning {
                    p.status = finished.status;
                }
                p.end_time.get_or_insert(end_time);
                p.snapshot()
            })
            .await
        else {
            return;
        };

        metrics::counter!("scans_completed_total", "status" => snapshot.status.as_str())
            .increment(1);

        info!(
            event = "library_scan_finished",
            scan_id = %scan_id,
            status = snapshot.status.as_str(),
            total_items = snapshot.total_items,
            processed_items = snapshot.processed_items,
            files_found = snapshot.files_found,
            directories_found = snapshot.directories_found,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Scan finished"
        );
    }

    async fn perform_scan(
        &self,
        scan_id: &str,
        root: &Path,
        options: &ScanOptions,
    ) -> Result<(), LibraryError> {
        let count_root = root.to_path_buf();
        let config = self.config.clone();
        let total = tokio::task::spawn_blocking(move || count_items(&count_root, &config)).await?;
        self.update(scan_id, |p| p.total_items = total).await;

        let (tx, mut rx) = mpsc::channel(WALK_CHANNEL_CAPACITY);
        let walk_root = root.to_path_buf();
        let config = self.config.clone();

        // Dropping `rx` makes the next send fail, which ends the walk.
        let walker = tokio::task::spawn_blocking(move || {
            for entry in walk_entries(&walk_root, &config) {
                let item = match entry {
                    Ok(entry) => match build_item(&entry, &config) {
                        Some(item) => item,
                        None => continue,
                    },
                    Err(e) => Err(ScanErrorEntry::new(
                        "item_error",
                        e.to_string(),
                        e.path().map(|p| p.display().to_string()),
                    )),
                };
                if tx.blocking_send(item).is_err() {
                    break;
                }
            }
        });

        while let Some(item) = rx.recv().await {
            if self.is_cancelled(scan_id).await {
                debug!(scan_id = %scan_id, "Scan cancelled, stopping walk");
                break;
            }

            let item = match item {
                Ok(ScanItem::File(mut file)) => {
                    if options.extract_metadata && self.config.is_video(Path::new(&file.path)) {
                        match self
                            .extractor
                            .extract_video_metadata(Path::new(&file.path))
                            .await
                        {
                            Ok(metadata) => file.media_metadata = Some(metadata),
                            Err(e) => {
                                warn!(path = %file.path, error = %e, "Media metadata extraction failed");
                            }
                        }
                    }
                    Ok(ScanItem::File(file))
                }
                other => other,
            };

            let processed = self
                .update(scan_id, |p| {
                    match item {
                        Ok(item) => {
                            p.current_path = item.path().to_string();
                            if item.is_file() {
                                p.files_found += 1;
                            } else {
                                p.directories_found += 1;
                            }
                            p.scan_results.push(item);
                        }
                        Err(entry) => p.errors.push(entry),
                    }
                    p.processed_items += 1;
                    p.processed_items
                })
                .await
                .unwrap_or_default();

            if processed % PROGRESS_LOG_EVERY == 0 {
                info!(scan_id = %scan_id, processed, total, "Scan progress");
            }
        }

        drop(rx);
        walker.await?;

        Ok(())
    }

    async fn filter_duplicates(&self, scan_id: &str, library_path: &str, options: &ScanOptions) {
        let provided = options.existing_files.is_some() || options.existing_directories.is_some();

        let existing = if provided {
            Ok((
                options.existing_files.clone().unwrap_or_default(),
                options.existing_directories.clone().unwrap_or_default(),
            ))
        } else {
            self.store.existing_library_items(library_path).await
        };

        let (existing_files, existing_dirs) = match existing {
            Ok(existing) => existing,
            Err(e) => {
                error!(scan_id = %scan_id, error = %e, "Duplicate checking failed");
                self.update(scan_id, |p| {
                    p.errors.push(ScanErrorEntry::new(
                        "duplicate_check_error",
                        format!("{e:#}"),
                        None,
                    ));
                })
                .await;
                return;
            }
        };

        self.update(scan_id, |p| {
            let items = std::mem::take(&mut p.scan_results);
            let original = items.len();
            let (kept, report) =
                check_duplicates(library_path, items, &existing_files, &existing_dirs);

            p.files_found = kept.iter().filter(|i| i.is_file()).count();
            p.directories_found = kept.len() - p.files_found;

            info!(
                scan_id = %scan_id,
                duplicates_found = report.duplicates_found,
                new_items = report.new_items,
                differences = report.differences.len(),
                duplicates_removed = original - kept.len(),
                "Duplicate check completed"
            );

            p.scan_results = kept;
            p.duplicate_report = Some(report);
        })
        .await;
    }

    async fn persist(&self, progress: &ScanProgress) {
        let scan_id = progress.scan_id.as_str();
        match self.store.save_scan(progress).await {
            Ok(saved) => info!(
                scan_id = %scan_id,
                files_saved = saved.files_saved,
                directories_saved = saved.directories_saved,
                "Scan results saved"
            ),
            Err(e) => {
                error!(scan_id = %scan_id, error = %e, "Failed to save scan results");
                self.update(scan_id, |p| {
                    p.errors.push(ScanErrorEntry::new(
                        "database_save_error",
                        format!("{e:#}"),
                        None,
                    ));
                })
                .await;
            }
        }
    }

    async fn update<R>(&self, scan_id: &str, f: impl FnOnce(&mut ScanProgress) -> R) -> Option<R> {
        let mut scans = self.scans.write().await;
        scans.get_mut(scan_id).map(f)
    }

    async fn is_cancelled(&self, scan_id: &str) -> bool {
        let scans = self.scans.read().await;
        scans
            .get(scan_id)
            .is_none_or(|p| p.status == ScanStatus::Cancelled)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get_scan_status(&self, scan_id: &str) -> Option<ScanSnapshot> {
        let scans = self.scans.read().await;
        scans.get(scan_id).map(ScanProgress::snapshot)
    }

    /// Only available once the scan has completed.
    pub async fn get_scan_results(&self, scan_id: &str) -> Result<ScanResults, LibraryError> {
        let scans = self.scans.read().await;
        let progress = scans
            .get(scan_id)
            .ok_or_else(|| LibraryError::NotFound(format!("Scan {scan_id}")))?;

        if progress.status != ScanStatus::Completed {
            return Err(LibraryError::ScanOperation(format!(
                "Scan {scan_id} is not completed (status: {})",
                progress.status.as_str()
            )));
        }

        Ok(ScanResults {
            scan: progress.snapshot(),
            items: progress.scan_results.clone(),
        })
    }

    /// Cancels a running scan. Returns false when it is not running.
    pub async fn stop_scan(&self, scan_id: &str) -> bool {
        let stopped = self
            .update(scan_id, |p| {
                if p.status == ScanStatus::Scanning {
                    p.status = ScanStatus::Cancelled;
                    p.end_time = Some(Utc::now());
                    true
                } else {
                    false
                }
            })
            .await
            .unwrap_or(false);

        if stopped {
            info!(scan_id = %scan_id, "Scan cancelled");
        }
        stopped
    }

    /// Newest first.
    pub async fn list_scans(&self, status: Option<ScanStatus>) -> Vec<ScanSnapshot> {
        let scans = self.scans.read().await;
        let mut list: Vec<&ScanProgress> = scans
            .values()
            .filter(|p| status.is_none_or(|s| p.status == s))
            .collect();
        list.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        list.into_iter().map(ScanProgress::snapshot).collect()
    }

    pub async fn cleanup_scan(&self, scan_id: &str) -> Result<(), LibraryError> {
        let mut scans = self.scans.write().await;
        let progress = scans
            .get(scan_id)
            .ok_or_else(|| LibraryError::NotFound(format!("Scan {scan_id}")))?;

        if !progress.status.is_finished() {
            return Err(LibraryError::ScanOperation(format!(
                "Scan {scan_id} is still running"
            )));
        }

        scans.remove(scan_id);
        Ok(())
    }

    /// Drops finished scans that ended more than `max_age_hours` ago.
    pub async fn cleanup_completed_scans(&self, max_age_hours: u64) -> usize {
        let Some(cutoff) = age_cutoff(max_age_hours) else {
            return 0;
        };
        let mut scans = self.scans.write().await;
        let before = scans.len();
        scans.retain(|_, p| {
            !(p.status.is_finished() && p.end_time.is_some_and(|end| end < cutoff))
        });
        let removed = before - scans.len();
        info!(removed_count = removed, "Cleaned up scans");
        removed
    }

    pub async fn active_scan_count(&self) -> usize {
        let scans = self.scans.read().await;
        scans
            .values()
            .filter(|p| p.status == ScanStatus::Scanning)
            .count()
    }
}

// ============================================================================
// Walking
// ============================================================================

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

/// Every entry below `root`, never descending past `max_scan_depth`.
fn walk_entries(
    root: &Path,
    config: &ScannerConfig,
) -> impl Iterator<Item = walkdir::Result<DirEntry>> + use<> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(config.max_scan_depth.saturating_add(1))
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
}

fn count_items(root: &Path, config: &ScannerConfig) -> usize {
    walk_entries(root, config)
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_dir() || config.is_media(e.path()))
        .count()
}

fn has_video_child(dir: &Path, config: &ScannerConfig) -> bool {
    std::fs::read_dir(dir).is_ok_and(|entries| {
        entries
            .filter_map(Result::ok)
            .any(|e| e.path().is_file() && config.is_video(&e.path()))
    })
}

/// `None` for entries the scan ignores.
fn build_item(
    entry: &DirEntry,
    config: &ScannerConfig,
) -> Option<Result<ScanItem, ScanErrorEntry>> {
    let path = entry.path();
    let name = entry.file_name().to_string_lossy().to_string();
    let path_str = path.display().to_string();

    if entry.file_type().is_dir() {
        let item = file_metadata(path, false)
            .map(|metadata| {
                ScanItem::Directory(DirectoryEntry {
                    media_type: classify_directory(&name, has_video_child(path, config))
                        .to_string(),
                    path: path_str.clone(),
                    name,
                    metadata,
                })
            })
            .map_err(|e| ScanErrorEntry::new("directory_error", e.to_string(), Some(path_str)));
        return Some(item);
    }

    if !config.is_media(path) {
        return None;
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let item = file_metadata(path, false)
        .map(|metadata| {
            ScanItem::File(FileEntry {
                extension: path
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_default(),
                media_type: classify_file(&name).to_string(),
                parsed_info: parse_media_filename(&stem),
                media_metadata: None,
                path: path_str.clone(),
                name,
                metadata,
            })
        })
        .map_err(|e| ScanErrorEntry::new("file_error", e.to_string(), Some(path_str)));
    Some(item)
}

// ============================================================================
// Duplicate detection
// ============================================================================

fn existing_key(library_path: &str, item: &ExistingItem) -> String {
    format!(
        "{}:{}",
        item.library_path.as_deref().unwrap_or(library_path),
        item.path
    )
}

fn compare_item(item: &ScanItem, existing: &ExistingItem) -> Vec<FieldDifference> {
    let mut differences = Vec::new();
    let metadata = item.metadata();

    if Some(metadata.size) != existing.size {
        differences.push(FieldDifference {
            field: "size".to_string(),
            new_value: metadata.size.into(),
            existing_value: existing.size.map_or(serde_json::Value::Null, Into::into),
        });
    }

    if metadata.modified != existing.modified {
        differences.push(FieldDifference {
            field: "modified_time".to_string(),
            new_value: metadata.modified.clone().into(),
            existing_value: existing.modified.clone().into(),
        });
    }

    if Some(item.media_type()) != existing.media_type.as_deref() {
        differences.push(FieldDifference {
            field: "media_type".to_string(),
            new_value: item.media_type().into(),
            existing_value: existing.media_type.clone().into(),
        });
    }

    differences
}

/// Splits scan items into new ones and a report on those already stored.
/// Items are matched on `"{library_path}:{path}"`.
#[must_use]
pub fn check_duplicates(
    library_path: &str,
    items: Vec<ScanItem>,
    existing_files: &[ExistingItem],
    existing_dirs: &[ExistingItem],
) -> (Vec<ScanItem>, DuplicateReport) {
    let files: HashMap<String, &ExistingItem> = existing_files
        .iter()
        .map(|e| (existing_key(library_path, e), e))
        .collect();
    let dirs: HashMap<String, &ExistingItem> = existing_dirs
        .iter()
        .map(|e| (existing_key(library_path, e), e))
        .collect();

    let mut report = DuplicateReport::default();
    let mut kept = Vec::new();

    for item in items {
        let key = format!("{library_path}:{}", item.path());
        let existing = if item.is_file() {
            files.get(&key)
        } else {
            dirs.get(&key)
        };

        match existing {
            Some(existing) => {
                report.duplicates_found += 1;
                let differences = compare_item(&item, existing);
                if !differences.is_empty() {
                    report.differences.push(ItemDifference {
                        path: item.path().to_string(),
                        item_type: if item.is_file() { "file" } else { "directory" }.to_string(),
                        differences,
                    });
                }
            }
            None => {
                report.new_items += 1;
                kept.push(item);
            }
        }
    }

    (kept, report)
}
