use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::media::{FileMetadata, MediaMetadata, ParsedInfo};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Scanning,
    Completed,
    Error,
    Cancelled,
}

impl ScanStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scanning => "scanning",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        !matches!(self, Self::Scanning)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanErrorEntry {
    /// e.g. `scan_error`, `item_error`, `duplicate_check_error`
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub path: Option<String>,
    pub timestamp: String,
}

impl ScanErrorEntry {
    pub fn new(kind: &str, message: impl Into<String>, path: Option<String>) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.into(),
            path,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub path: String,
    pub name: String,
    pub media_type: String,
    pub metadata: FileMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub path: String,
    pub name: String,
    pub extension: String,
    pub media_type: String,
    pub metadata: FileMetadata,
    pub media_metadata: Option<MediaMetadata>,
    pub parsed_info: ParsedInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ScanItem {
    Directory(DirectoryEntry),
    File(FileEntry),
}

impl ScanItem {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Directory(d) => &d.path,
            Self::File(f) => &f.path,
        }
    }

    #[must_use]
    pub fn media_type(&self) -> &str {
        match self {
            Self::Directory(d) => &d.media_type,
            Self::File(f) => &f.media_type,
        }
    }

    #[must_use]
    pub const fn metadata(&self) -> &FileMetadata {
        match self {
            Self::Directory(d) => &d.metadata,
            Self::File(f) => &f.metadata,
        }
    }

    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

/// A previously stored item the duplicate check compares against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExistingItem {
    pub path: String,
    pub library_path: Option<String>,
    pub size: Option<u64>,
    pub modified: Option<String>,
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDifference {
    pub field: String,
    pub new_value: serde_json::Value,
    pub existing_value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemDifference {
    pub path: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub differences: Vec<FieldDifference>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateReport {
    pub duplicates_found: usize,
    pub new_items: usize,
    pub differences: Vec<ItemDifference>,
}

#[derive(Debug, Clone)]
pub struct ScanProgress {
    pub scan_id: String,
    pub library_path: String,
    pub total_items: usize,
    pub processed_items: usize,
    pub current_path: String,
    pub status: ScanStatus,
    pub errors: Vec<ScanErrorEntry>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub files_found: usize,
    pub directories_found: usize,
    pub scan_results: Vec<ScanItem>,
    pub duplicate_report: Option<DuplicateReport>,
}

impl ScanProgress {
    #[must_use]
    pub fn new(scan_id: String, library_path: String) -> Self {
        Self {
            scan_id,
            library_path,
            total_items: 0,
            processed_items: 0,
            current_path: String::new(),
            status: ScanStatus::Scanning,
            errors: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
            files_found: 0,
            directories_found: 0,
            scan_results: Vec::new(),
            duplicate_report: None,
        }
    }

    /// Rounded to two decimals, zero while nothing has been counted.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self) -> f64 {
        if self.total_items == 0 {
            return 0.0;
        }
        let pct = self.processed_items as f64 / self.total_items as f64 * 100.0;
        (pct * 100.0).round() / 100.0
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn elapsed_seconds(&self) -> f64 {
        let end = self.end_time.unwrap_or_else(Utc::now);
        (end - self.start_time).num_milliseconds() as f64 / 1000.0
    }

    #[must_use]
    pub fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            scan_id: self.scan_id.clone(),
            library_path: self.library_path.clone(),
            total_items: self.total_items,
            processed_items: self.processed_items,
            percentage: self.percentage(),
            current_path: self.current_path.clone(),
            status: self.status,
            errors: self.errors.clone(),
            start_time: self.start_time.to_rfc3339(),
            end_time: self.end_time.map(|t| t.to_rfc3339()),
            elapsed_time: self.elapsed_seconds(),
            files_found: self.files_found,
            directories_found: self.directories_found,
            duplicate_report: self.duplicate_report.clone(),
        }
    }
}

/// Serializable view of a scan without its result list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSnapshot {
    pub scan_id: String,
    pub library_path: String,
    pub total_items: usize,
    pub processed_items: usize,
    pub percentage: f64,
    pub current_path: String,
    pub status: ScanStatus,
    pub errors: Vec<ScanErrorEntry>,
    pub start_time: String,
    pub end_time: Option<String>,
    pub elapsed_time: f64,
    pub files_found: usize,
    pub directories_found: usize,
    pub duplicate_report: Option<DuplicateReport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds_to_two_decimals() {
        let mut progress = ScanProgress::new("s".into(), "/lib".into());
        assert!((progress.percentage() - 0.0).abs() < f64::EPSILON);

        progress.total_items = 3;
        progress.processed_items = 1;
        assert!((progress.percentage() - 33.33).abs() < 1e-9);

        progress.processed_items = 3;
        assert!((progress.percentage() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_scan_item_is_tagged_by_type() {
        let item = ScanItem::Directory(DirectoryEntry {
            path: "/lib/Season 1".into(),
            name: "Season 1".into(),
            media_type: "season".into(),
            metadata: FileMetadata::default(),
        });
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "directory");
        assert_eq!(json["mediaType"], "season");
    }
}
