use crate::library::naming::sanitize_filename;
use crate::services::error::LibraryError;
use crate::services::filesystem::FileSystemManager;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// One file received from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub message: String,
    pub saved_files: Vec<String>,
}

#[derive(Clone)]
pub struct ImageService {
    client: Client,
    images_path: PathBuf,
    fs: FileSystemManager,
}

impl ImageService {
    #[must_use]
    pub fn new(client: Client, fs: FileSystemManager) -> Self {
        let images_path = PathBuf::from(&fs.config().images_path);
        Self {
            client,
            images_path,
            fs,
        }
    }

    #[must_use]
    pub fn images_path(&self) -> &Path {
        &self.images_path
    }

    /// Downloads a poster to `{id}_poster.{ext}` and returns the stored file name.
    pub async fn download_poster(&self, url: &str, id: &str) -> Result<String> {
        let extension = Path::new(url.split('?').next().unwrap_or(url))
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| is_image_extension(e))
            .unwrap_or("jpg");

        let filename = format!("{}_poster.{extension}", sanitize_filename(id));

        if !self.images_path.exists() {
            fs::create_dir_all(&self.images_path).await?;
        }
        let file_path = self.images_path.join(&filename);

        info!(url = %url, path = %file_path.display(), "Downloading poster");

        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("Poster request failed: {url}"))?;
        let bytes = response.bytes().await?;

        fs::write(&file_path, bytes)
            .await
            .with_context(|| format!("Failed to write image to {}", file_path.display()))?;

        Ok(filename)
    }

    /// Deletes a file previously stored by `download_poster`.
    pub async fn remove_image(&self, file_name: &str) -> Result<()> {
        let name = Path::new(file_name)
            .file_name()
            .with_context(|| format!("Invalid image name: {file_name}"))?;
        let path = self.images_path.join(name);
        if path.exists() {
            fs::remove_file(&path)
                .await
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }

    /// Stores uploaded images under `save_location`, relative to the images
    /// directory unless absolute. Non-image files are rejected before
    /// anything is written.
    pub async fn save_uploads(
        &self,
        files: Vec<UploadedFile>,
        save_location: Option<&str>,
    ) -> Result<UploadOutcome, LibraryError> {
        if files.is_empty() {
            return Err(LibraryError::file_op("No files provided"));
        }

        for file in &files {
            if !is_image_upload(file) {
                return Err(LibraryError::InvalidFileType(format!(
                    "{} is not an image",
                    file.file_name
                )));
            }
        }

        let dir = match save_location.map(str::trim).filter(|s| !s.is_empty()) {
            Some(loc) if Path::new(loc).is_absolute() => {
                self.fs.validate_path_security(Path::new(loc))?
            }
            Some(loc) => self.images_path.join(loc.trim_start_matches(['/', '\\'])),
            None => self.images_path.clone(),
        };
        if dir.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
            return Err(LibraryError::security(format!(
                "Path traversal detected: {}",
                dir.display()
            )));
        }
        fs::create_dir_all(&dir).await?;

        let mut saved_files = Vec::with_capacity(files.len());
        for file in files {
            let name = unique_name(&dir, &upload_file_name(&file.file_name));
            let target = dir.join(&name);
            fs::write(&target, &file.bytes).await?;
            info!(path = %target.display(), bytes = file.bytes.len(), "Saved uploaded image");
            saved_files.push(target.display().to_string());
        }

        Ok(UploadOutcome {
            message: "Files uploaded successfully".to_string(),
            saved_files,
        })
    }
}

fn is_image_extension(ext: &str) -> bool {
    mime_guess::from_ext(ext)
        .first()
        .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE)
}

fn is_image_upload(file: &UploadedFile) -> bool {
    let declared = file
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("image/"));
    let guessed = mime_guess::from_path(&file.file_name)
        .first()
        .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE);
    guessed || (declared && Path::new(&file.file_name).extension().is_none())
}

/// Keeps the last path segment and strips characters unsafe in file names.
fn upload_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned = sanitize_filename(base).replace(' ', "_");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        format!("upload_{}", uuid::Uuid::new_v4())
    } else {
        cleaned.to_string()
    }
}

fn unique_name(dir: &Path, name: &str) -> String {
    if !dir.join(name).exists() {
        return name.to_string();
    }
    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    (1..)
        .map(|i| format!("{stem}_{i}{ext}"))
        .find(|candidate| !dir.join(candidate).exists())
        .unwrap_or_else(|| format!("{stem}_{}{ext}", uuid::Uuid::new_v4()))
}
