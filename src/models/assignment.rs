use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Assigned,
    Organizing,
    Organized,
    Failed,
}

impl AssignmentStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::Organizing => "organizing",
            Self::Organized => "organized",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assigned" => Ok(Self::Assigned),
            "organizing" => Ok(Self::Organizing),
            "organized" => Ok(Self::Organized),
            "failed" => Ok(Self::Failed),
            other => Err(format!("Unknown assignment status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssignedMediaType {
    Movie,
    Episode,
}

impl AssignedMediaType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Episode => "episode",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: String,
    pub operation: String,
    pub source_path: String,
    pub target_path: String,
    /// "completed" or "failed"
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAssignment {
    pub id: String,
    pub user_id: Option<String>,
    pub file_id: String,
    pub media_type: AssignedMediaType,
    /// Movie id or episode id, depending on `media_type`
    pub media_id: String,
    pub series_id: Option<String>,
    pub season_number: Option<i32>,
    pub version: Option<String>,
    pub status: AssignmentStatus,
    pub is_organized: bool,
    pub target_path: Option<String>,
    pub source_file: SourceFile,
    pub organization_history: Vec<HistoryEntry>,
    pub date_assigned: String,
    pub date_organized: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AssignmentInput {
    pub user_id: Option<String>,
    pub file_id: String,
    pub media_type: AssignedMediaType,
    pub media_id: String,
    pub series_id: Option<String>,
    pub season_number: Option<i32>,
    pub version: Option<String>,
    pub source_file: SourceFile,
}
