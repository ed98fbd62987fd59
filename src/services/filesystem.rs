//! Guarded filesystem operations for the media library: every path is checked
//! against the configured base directories before it is touched.

use crate::config::LibraryConfig;
use crate::constants::files::{CHECKSUM_CHUNK_SIZE, INVALID_NAME_CHARS};
use crate::library::{RecycleBin, transfer};
use crate::models::media::FileMetadata;
use crate::parser::size::size_mb;
use crate::services::error::LibraryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOp {
    Read,
    Write,
    Delete,
    Create,
    Move,
    MoveDestination,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct PathPermissions {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationCheck {
    pub path_exists: bool,
    pub path_secure: bool,
    pub permissions: PathPermissions,
    pub file_locked: bool,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameOutcome {
    pub success: bool,
    pub old_path: String,
    pub new_path: String,
    pub operation: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MovedItem {
    pub source: String,
    pub destination: String,
    #[serde(rename = "type")]
    pub item_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub success: bool,
    pub source_path: String,
    pub destination_path: String,
    pub operation: &'static str,
    pub moved_items: Vec<MovedItem>,
    pub items_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub deleted_path: String,
    /// `trash` or `permanent`
    pub method: &'static str,
    pub operation: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trash_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedMove {
    pub source_path: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkMoveOutcome {
    pub successful_moves: Vec<MoveOutcome>,
    pub failed_moves: Vec<FailedMove>,
    pub total_items: usize,
    pub successful_count: usize,
    pub failed_count: usize,
    pub operation: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ListingEntry {
    Item(FileMetadata),
    Unreadable {
        path: String,
        name: String,
        error: String,
    },
}

impl ListingEntry {
    fn is_directory(&self) -> bool {
        matches!(self, Self::Item(m) if m.is_directory)
    }

    fn name(&self) -> &str {
        match self {
            Self::Item(m) => &m.name,
            Self::Unreadable { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStatus {
    pub path: String,
    pub exists: bool,
    pub is_file: bool,
    pub is_directory: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedPath {
    pub path: String,
    pub exists: bool,
    pub accessible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FileMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub accessible: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub verification_results: Vec<VerifiedPath>,
    pub summary: VerificationSummary,
}

#[derive(Clone)]
pub struct FileSystemManager {
    config: LibraryConfig,
    allowed_roots: Vec<PathBuf>,
    recycle_bin: RecycleBin,
}

impl FileSystemManager {
    #[must_use]
    pub fn new(config: LibraryConfig) -> Self {
        let allowed_roots = config
            .allowed_base_paths
            .iter()
            .map(|p| resolve_lenient(Path::new(p)))
            .collect();
        let recycle_bin = RecycleBin::new(&config.recycle_path, config.recycle_cleanup_days);

        Self {
            config,
            allowed_roots,
            recycle_bin,
        }
    }

    #[must_use]
    pub const fn recycle_bin(&self) -> &RecycleBin {
        &self.recycle_bin
    }

    #[must_use]
    pub const fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// Rejects `..` components and anything outside the allowed base paths.
    /// Returns the resolved path.
    pub fn validate_path_security(&self, path: &Path) -> Result<PathBuf, LibraryError> {
        if path.as_os_str().is_empty() {
            return Err(LibraryError::security("Empty path"));
        }
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(LibraryError::security(format!(
                "Path traversal detected: {}",
                path.display()
            )));
        }

        let resolved = resolve_lenient(path);

        if self.allowed_roots.is_empty() {
            return Ok(resolved);
        }

        if self.allowed_roots.iter().any(|root| resolved.starts_with(root)) {
            Ok(resolved)
        } else {
            Err(LibraryError::security(format!(
                "Path outside allowed directories: {}",
                path.display()
            )))
        }
    }

    pub async fn validate_operation(&self, path: &Path, op: FileOp) -> OperationCheck {
        let security = self.validate_path_security(path);
        let path_secure = security.is_ok();
        let path_exists = tokio::fs::try_exists(path).await.unwrap_or(false);
        let permissions = check_permissions(path);
        let file_locked = is_file_locked(path);

        let needs_existing = !matches!(op, FileOp::Create | FileOp::MoveDestination);
        let valid = path_secure && (path_exists || !needs_existing) && !file_locked;

        OperationCheck {
            path_exists,
            path_secure,
            permissions,
            file_locked,
            valid,
            security_error: security.err().map(|e| e.to_string()),
        }
    }

    async fn require_valid(&self, path: &Path, op: FileOp) -> Result<(), LibraryError> {
        let check = self.validate_operation(path, op).await;
        if let Some(err) = check.security_error {
            return Err(LibraryError::PathSecurity(err));
        }
        if !check.path_exists && !matches!(op, FileOp::Create | FileOp::MoveDestination) {
            return Err(LibraryError::NotFound(path.display().to_string()));
        }
        if check.file_locked {
            return Err(LibraryError::file_op(format!(
                "File is locked: {}",
                path.display()
            )));
        }
        Ok(())
    }

    pub async fn rename_file(
        &self,
        path: &Path,
        new_name: &str,
    ) -> Result<RenameOutcome, LibraryError> {
        self.require_valid(path, FileOp::Write).await?;

        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(LibraryError::file_op("New name cannot be empty"));
        }
        if new_name.contains(INVALID_NAME_CHARS) {
            return Err(LibraryError::file_op(format!(
                "New name contains invalid characters: {new_name}"
            )));
        }

        let mut final_name = new_name.to_string();
        if path.is_file()
            && let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_string())
        {
            let suffix = format!(".{}", ext.to_lowercase());
            if !final_name.to_lowercase().ends_with(&suffix) {
                final_name = format!("{final_name}.{ext}");
            }
        }

        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let new_path = parent.join(&final_name);
        self.validate_path_security(&new_path)?;

        if tokio::fs::try_exists(&new_path).await.unwrap_or(false) {
            return Err(LibraryError::file_op(format!(
                "Destination already exists: {}",
                new_path.display()
            )));
        }

        tokio::fs::rename(path, &new_path).await?;
        info!(old = %path.display(), new = %new_path.display(), "Renamed");

        Ok(RenameOutcome {
            success: true,
            old_path: path.display().to_string(),
            new_path: new_path.display().to_string(),
            operation: "rename",
        })
    }

    /// Moves a file or directory. With `merge` set, a directory moved onto an
    /// existing directory has its contents merged; conflicting files stay in
    /// the source.
    pub async fn move_file(
        &self,
        source: &Path,
        destination: &Path,
        merge: bool,
    ) -> Result<MoveOutcome, LibraryError> {
        self.require_valid(source, FileOp::Move).await?;
        self.require_valid(destination, FileOp::MoveDestination).await?;

        if destination.starts_with(source) && destination != source {
            return Err(LibraryError::file_op("Cannot move a directory into itself"));
        }

        let (src, dst) = (source.to_path_buf(), destination.to_path_buf());
        let verify = self.config.enable_file_integrity_checks;
        let (operation, moved_items) = tokio::task::spawn_blocking(move || {
            let before = if verify && src.is_file() {
                Some(sha256_file(&src)?)
            } else {
                None
            };
            let moved = move_blocking(&src, &dst, merge)?;
            if let Some(expected) = before {
                verify_checksum(&dst, &expected)?;
            }
            Ok::<_, LibraryError>(moved)
        })
        .await??;

        info!(
            source = %source.display(),
            destination = %destination.display(),
            operation,
            items = moved_items.len(),
            "Moved"
        );

        Ok(MoveOutcome {
            success: true,
            source_path: source.display().to_string(),
            destination_path: destination.display().to_string(),
            operation,
            items_count: moved_items.len(),
            moved_items,
        })
    }

    pub async fn delete_file(
        &self,
        path: &Path,
        use_trash: bool,
    ) -> Result<DeleteOutcome, LibraryError> {
        self.require_valid(path, FileOp::Delete).await?;

        if use_trash && self.config.use_trash_for_deletes {
            let item = self
                .recycle_bin
                .recycle(path, "delete")
                .await
                .map_err(|e| LibraryError::file_op(format!("Failed to move to trash: {e:#}")))?;

            return Ok(DeleteOutcome {
                deleted_path: path.display().to_string(),
                method: "trash",
                operation: "delete",
                trash_path: Some(item.recycled_path.display().to_string()),
            });
        }

        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || transfer::remove_path(&target))
            .await?
            .map_err(|e| LibraryError::file_op(format!("{e:#}")))?;
        info!(path = %path.display(), "Permanently deleted");

        Ok(DeleteOutcome {
            deleted_path: path.display().to_string(),
            method: "permanent",
            operation: "delete",
            trash_path: None,
        })
    }

    pub async fn bulk_move(
        &self,
        sources: &[String],
        destination_dir: &Path,
        merge: bool,
    ) -> Result<BulkMoveOutcome, LibraryError> {
        self.validate_path_security(destination_dir)?;
        tokio::fs::create_dir_all(destination_dir).await?;
        if !destination_dir.is_dir() {
            return Err(LibraryError::file_op(format!(
                "Destination is not a directory: {}",
                destination_dir.display()
            )));
        }

        let mut successful_moves = Vec::new();
        let mut failed_moves = Vec::new();

        for source in sources {
            let source_path = Path::new(source);
            let Some(name) = source_path.file_name() else {
                failed_moves.push(FailedMove {
                    source_path: source.clone(),
                    error: "Invalid source path".to_string(),
                });
                continue;
            };

            match self
                .move_file(source_path, &destination_dir.join(name), merge)
                .await
            {
                Ok(outcome) => successful_moves.push(outcome),
                Err(e) => {
                    warn!(source = %source, error = %e, "Bulk move item failed");
                    failed_moves.push(FailedMove {
                        source_path: source.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(BulkMoveOutcome {
            total_items: sources.len(),
            successful_count: successful_moves.len(),
            failed_count: failed_moves.len(),
            successful_moves,
            failed_moves,
            operation: "bulk_move",
        })
    }

    pub async fn create_directory(&self, path: &Path) -> Result<FileMetadata, LibraryError> {
        self.require_valid(path, FileOp::Create).await?;
        tokio::fs::create_dir_all(path).await?;
        self.get_file_metadata(path, false).await
    }

    pub async fn path_status(&self, path: &Path) -> Result<PathStatus, LibraryError> {
        self.validate_path_security(path)?;
        let meta = tokio::fs::metadata(path).await.ok();
        Ok(PathStatus {
            path: path.display().to_string(),
            exists: meta.is_some(),
            is_file: meta.as_ref().is_some_and(std::fs::Metadata::is_file),
            is_directory: meta.as_ref().is_some_and(std::fs::Metadata::is_dir),
        })
    }

    pub async fn get_file_metadata(
        &self,
        path: &Path,
        checksum: bool,
    ) -> Result<FileMetadata, LibraryError> {
        self.validate_path_security(path)?;
        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || file_metadata(&target, checksum)).await?
    }

    /// Directories first, then files, each sorted by name.
    pub async fn list_directory(&self, path: &Path) -> Result<Vec<ListingEntry>, LibraryError> {
        self.require_valid(path, FileOp::Read).await?;
        if !path.is_dir() {
            return Err(LibraryError::file_op(format!(
                "Not a directory: {}",
                path.display()
            )));
        }

        let target = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let mut entries: Vec<ListingEntry> = fs::read_dir(&target)?
                .filter_map(Result::ok)
                .map(|entry| {
                    let entry_path = entry.path();
                    file_metadata(&entry_path, false).map_or_else(
                        |e| ListingEntry::Unreadable {
                            path: entry_path.display().to_string(),
                            name: entry.file_name().to_string_lossy().to_string(),
                            error: e.to_string(),
                        },
                        ListingEntry::Item,
                    )
                })
                .collect();

            entries.sort_by(|a, b| {
                b.is_directory()
                    .cmp(&a.is_directory())
                    .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
            });
            Ok(entries)
        })
        .await?
    }

    /// Checks that each path still exists and can be read. Paths outside the
    /// allowed directories count as inaccessible.
    pub async fn verify_files(&self, paths: &[String]) -> Verification {
        let mut results = Vec::with_capacity(paths.len());
        let mut summary = VerificationSummary {
            total: paths.len(),
            ..Default::default()
        };

        for raw in paths {
            let path = Path::new(raw);
            let exists = tokio::fs::try_exists(path).await.unwrap_or(false);
            let outcome = if exists {
                self.get_file_metadata(path, false).await
            } else {
                Err(LibraryError::NotFound(raw.clone()))
            };

            let result = match outcome {
                Ok(meta) => {
                    summary.accessible += 1;
                    VerifiedPath {
                        path: raw.clone(),
                        exists,
                        accessible: true,
                        metadata: Some(meta),
                        error: None,
                    }
                }
                Err(e) => {
                    if !exists {
                        summary.missing += 1;
                    }
                    VerifiedPath {
                        path: raw.clone(),
                        exists,
                        accessible: false,
                        metadata: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            results.push(result);
        }

        Verification {
            verification_results: results,
            summary,
        }
    }
}

// ============================================================================
// Blocking helpers
// ============================================================================

/// Canonicalizes the longest existing ancestor and re-appends the rest.
fn resolve_lenient(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }

    let mut tail = Vec::new();
    let mut current = path;
    while let Some(parent) = current.parent() {
        if let Some(name) = current.file_name() {
            tail.push(name.to_os_string());
        }
        if let Ok(canonical) = fs::canonicalize(parent) {
            let mut resolved = canonical;
            for part in tail.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
        current = parent;
    }

    path.to_path_buf()
}

/// Permissions of the path, or of its parent (write only) when it does not exist yet.
#[must_use]
pub fn check_permissions(path: &Path) -> PathPermissions {
    match fs::metadata(path) {
        Ok(meta) => {
            let read = if meta.is_dir() {
                fs::read_dir(path).is_ok()
            } else {
                fs::File::open(path).is_ok()
            };
            PathPermissions {
                read,
                write: !meta.permissions().readonly(),
                execute: is_executable(&meta),
            }
        }
        Err(_) => {
            let write = path
                .parent()
                .and_then(|p| fs::metadata(p).ok())
                .is_some_and(|m| !m.permissions().readonly());
            PathPermissions {
                read: false,
                write,
                execute: false,
            }
        }
    }
}

/// A file that cannot be opened for append is treated as in use.
#[must_use]
pub fn is_file_locked(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    fs::OpenOptions::new().append(true).open(path).is_err()
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(meta: &fs::Metadata) -> bool {
    meta.is_dir()
}

#[cfg(unix)]
fn permission_string(meta: &fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    let mode = meta.permissions().mode();
    let kind = if meta.is_dir() { 'd' } else { '-' };
    let mut out = String::with_capacity(10);
    out.push(kind);
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

#[cfg(not(unix))]
fn permission_string(meta: &fs::Metadata) -> String {
    let kind = if meta.is_dir() { 'd' } else { '-' };
    let write = if meta.permissions().readonly() { '-' } else { 'w' };
    format!("{kind}r{write}-r{write}-r{write}-")
}

fn format_time(time: std::io::Result<SystemTime>) -> Option<String> {
    time.ok().map(|t| DateTime::<Utc>::from(t).to_rfc3339())
}

pub fn sha256_file(path: &Path) -> Result<String, LibraryError> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHECKSUM_CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

fn verify_checksum(path: &Path, expected: &str) -> Result<(), LibraryError> {
    let actual = sha256_file(path)?;
    if actual != expected {
        warn!(path = %path.display(), expected, actual = %actual, "Checksum mismatch after move");
        return Err(LibraryError::file_op(format!(
            "Checksum mismatch after move: {}",
            path.display()
        )));
    }
    Ok(())
}

pub fn file_metadata(path: &Path, checksum: bool) -> Result<FileMetadata, LibraryError> {
    let meta = fs::metadata(path)?;
    let size = meta.len();

    let checksum = if checksum && meta.is_file() {
        Some(sha256_file(path)?)
    } else {
        None
    };

    Ok(FileMetadata {
        path: path.display().to_string(),
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        extension: path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default(),
        size,
        size_mb: size_mb(size),
        created: format_time(meta.created()),
        modified: format_time(meta.modified()),
        accessed: format_time(meta.accessed()),
        permissions: permission_string(&meta),
        is_directory: meta.is_dir(),
        is_file: meta.is_file(),
        checksum,
    })
}

fn item_type(path: &Path) -> &'static str {
    if path.is_dir() { "directory" } else { "file" }
}

fn move_blocking(
    source: &Path,
    destination: &Path,
    merge: bool,
) -> Result<(&'static str, Vec<MovedItem>), LibraryError> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    if merge && source.is_dir() && destination.is_dir() {
        let mut moved = Vec::new();
        merge_into(source, destination, &mut moved)?;

        let emptied = fs::read_dir(source)?.next().is_none();
        let operation = if emptied {
            fs::remove_dir(source)?;
            "merge_and_remove"
        } else {
            "merge_partial"
        };
        return Ok((operation, moved));
    }

    if destination.exists() {
        return Err(LibraryError::file_op(format!(
            "Destination already exists: {}",
            destination.display()
        )));
    }

    let kind = item_type(source);
    transfer::move_path(source, destination).map_err(|e| LibraryError::file_op(format!("{e:#}")))?;

    Ok((
        "move",
        vec![MovedItem {
            source: source.display().to_string(),
            destination: destination.display().to_string(),
            item_type: kind,
        }],
    ))
}

fn merge_into(
    source: &Path,
    destination: &Path,
    moved: &mut Vec<MovedItem>,
) -> Result<(), LibraryError> {
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let from = entry.path();
        let to = destination.join(entry.file_name());

        if from.is_dir() && to.is_dir() {
            merge_into(&from, &to, moved)?;
            if fs::read_dir(&from)?.next().is_none() {
                fs::remove_dir(&from)?;
            }
        } else if to.exists() {
            warn!(
                source = %from.display(),
                destination = %to.display(),
                "Skipping conflicting item during merge"
            );
        } else {
            let kind = item_type(&from);
            transfer::move_path(&from, &to).map_err(|e| LibraryError::file_op(format!("{e:#}")))?;
            moved.push(MovedItem {
                source: from.display().to_string(),
                destination: to.display().to_string(),
                item_type: kind,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_for(root: &Path) -> FileSystemManager {
        FileSystemManager::new(LibraryConfig {
            allowed_base_paths: vec![root.display().to_string()],
            recycle_path: root.join(".trash").display().to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_rejects_traversal_and_outside_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager_for(tmp.path());

        let err = manager
            .validate_path_security(&tmp.path().join("a/../../etc"))
            .unwrap_err();
        assert!(matches!(err, LibraryError::PathSecurity(_)));

        let err = manager.validate_path_security(Path::new("/etc/passwd")).unwrap_err();
        assert!(matches!(err, LibraryError::PathSecurity(_)));

        assert!(manager
            .validate_path_security(&tmp.path().join("not/yet/created.mkv"))
            .is_ok());
    }

    #[test]
    fn test_empty_allow_list_allows_everything() {
        let manager = FileSystemManager::new(LibraryConfig::default());
        assert!(manager.validate_path_security(Path::new("/tmp")).is_ok());
    }

    #[tokio::test]
    async fn test_rename_appends_extension_and_refuses_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager_for(tmp.path());
        let file = tmp.path().join("inception.2010.mkv");
        fs::write(&file, b"x").unwrap();
        fs::write(tmp.path().join("Taken.mkv"), b"y").unwrap();

        let outcome = manager.rename_file(&file, "Inception (2010)").await.unwrap();
        assert!(outcome.new_path.ends_with("Inception (2010).mkv"));
        assert!(tmp.path().join("Inception (2010).mkv").exists());

        let err = manager
            .rename_file(&tmp.path().join("Inception (2010).mkv"), "Taken")
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::FileOperation(_)));

        let err = manager
            .rename_file(&tmp.path().join("Inception (2010).mkv"), "a/b")
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::FileOperation(_)));
    }

    #[tokio::test]
    async fn test_move_refuses_existing_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager_for(tmp.path());
        fs::write(tmp.path().join("a.mkv"), b"a").unwrap();
        fs::write(tmp.path().join("b.mkv"), b"b").unwrap();

        let err = manager
            .move_file(&tmp.path().join("a.mkv"), &tmp.path().join("b.mkv"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, LibraryError::FileOperation(_)));
        assert_eq!(fs::read(tmp.path().join("b.mkv")).unwrap(), b"b");
    }

    #[tokio::test]
    async fn test_move_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager_for(tmp.path());
        fs::write(tmp.path().join("a.mkv"), b"a").unwrap();

        let outcome = manager
            .move_file(
                &tmp.path().join("a.mkv"),
                &tmp.path().join("Movies/A (2000)/a.mkv"),
                false,
            )
            .await
            .unwrap();

        assert_eq!(outcome.operation, "move");
        assert_eq!(outcome.items_count, 1);
        assert!(tmp.path().join("Movies/A (2000)/a.mkv").exists());
    }

    #[tokio::test]
    async fn test_move_with_integrity_checks() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = FileSystemManager::new(LibraryConfig {
            allowed_base_paths: vec![tmp.path().display().to_string()],
            recycle_path: tmp.path().join(".trash").display().to_string(),
            enable_file_integrity_checks: true,
            ..Default::default()
        });
        fs::write(tmp.path().join("a.mkv"), b"payload").unwrap();

        manager
            .move_file(&tmp.path().join("a.mkv"), &tmp.path().join("b/a.mkv"), false)
            .await
            .unwrap();

        assert_eq!(fs::read(tmp.path().join("b/a.mkv")).unwrap(), b"payload");
        assert!(verify_checksum(&tmp.path().join("b/a.mkv"), "0000").is_err());
    }

    #[tokio::test]
    async fn test_merge_moves_new_items_and_keeps_conflicts() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager_for(tmp.path());
        let src = tmp.path().join("incoming/Show (2020)");
        let dst = tmp.path().join("Show (2020)");
        fs::create_dir_all(src.join("Season 01")).unwrap();
        fs::create_dir_all(dst.join("Season 01")).unwrap();
        fs::write(src.join("Season 01/e01.mkv"), b"new").unwrap();
        fs::write(src.join("Season 01/e02.mkv"), b"new").unwrap();
        fs::write(dst.join("Season 01/e01.mkv"), b"old").unwrap();

        let outcome = manager.move_file(&src, &dst, true).await.unwrap();

        assert_eq!(outcome.operation, "merge_partial");
        assert_eq!(outcome.items_count, 1);
        assert_eq!(fs::read(dst.join("Season 01/e01.mkv")).unwrap(), b"old");
        assert!(dst.join("Season 01/e02.mkv").exists());
        assert!(src.join("Season 01/e01.mkv").exists());
    }

    #[tokio::test]
    async fn test_merge_removes_emptied_source() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager_for(tmp.path());
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("a.srt"), b"1").unwrap();

        let outcome = manager.move_file(&src, &dst, true).await.unwrap();
        assert_eq!(outcome.operation, "merge_and_remove");
        assert!(!src.exists());
    }

    #[tokio::test]
    async fn test_delete_uses_trash() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager_for(tmp.path());
        let file = tmp.path().join("old.mkv");
        fs::write(&file, b"x").unwrap();

        let outcome = manager.delete_file(&file, true).await.unwrap();
        assert_eq!(outcome.method, "trash");
        assert!(!file.exists());
        assert_eq!(manager.recycle_bin().list().await.unwrap().len(), 1);

        let file = tmp.path().join("gone.mkv");
        fs::write(&file, b"x").unwrap();
        let outcome = manager.delete_file(&file, false).await.unwrap();
        assert_eq!(outcome.method, "permanent");
        assert_eq!(manager.recycle_bin().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bulk_move_reports_failures() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager_for(tmp.path());
        fs::write(tmp.path().join("a.mkv"), b"a").unwrap();

        let sources = vec![
            tmp.path().join("a.mkv").display().to_string(),
            tmp.path().join("missing.mkv").display().to_string(),
        ];
        let outcome = manager
            .bulk_move(&sources, &tmp.path().join("dest"), false)
            .await
            .unwrap();

        assert_eq!(outcome.total_items, 2);
        assert_eq!(outcome.successful_count, 1);
        assert_eq!(outcome.failed_count, 1);
        assert!(tmp.path().join("dest/a.mkv").exists());
    }

    #[tokio::test]
    async fn test_metadata_checksum_and_listing_order() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager_for(tmp.path());
        fs::write(tmp.path().join("b.txt"), b"hello").unwrap();
        fs::create_dir(tmp.path().join("z-dir")).unwrap();

        let meta = manager
            .get_file_metadata(&tmp.path().join("b.txt"), true)
            .await
            .unwrap();
        assert_eq!(meta.size, 5);
        assert_eq!(meta.extension, ".txt");
        assert_eq!(
            meta.checksum.as_deref(),
            Some("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
        );

        let listing = manager.list_directory(tmp.path()).await.unwrap();
        assert_eq!(listing[0].name(), "z-dir");
        assert_eq!(listing[1].name(), "b.txt");
    }

    #[tokio::test]
    async fn test_verify_counts_missing_and_accessible() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = manager_for(tmp.path());
        let present = tmp.path().join("present.mkv");
        fs::write(&present, b"x").unwrap();

        let report = manager
            .verify_files(&[
                present.display().to_string(),
                tmp.path().join("gone.mkv").display().to_string(),
            ])
            .await;

        assert_eq!(report.summary.total, 2);
        assert_eq!(report.summary.accessible, 1);
        assert_eq!(report.summary.missing, 1);
        assert!(report.verification_results[0].metadata.is_some());
        assert!(report.verification_results[1].error.is_some());
    }
}
